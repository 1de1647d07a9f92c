//! `url-mappings`: load a mappings file and query it from the command line.
//!
//! ```text
//! url-mappings --config mappings.toml list
//! url-mappings --config mappings.toml match /books/42 --method GET
//! url-mappings --config mappings.toml status 500 --exception SqlError --exception DataError
//! url-mappings --config mappings.toml reverse --controller book --action show --param id=42
//! url-mappings --config mappings.toml watch
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use url_mappings::config::schema::parse_method;
use url_mappings::config::watcher::ConfigWatcher;
use url_mappings::config::load_config;
use url_mappings::lifecycle::signals::wait_for_shutdown_signal;
use url_mappings::lifecycle::{run_reload_loop, MappingsRegistry};
use url_mappings::observability::logging::init_logging;
use url_mappings::routing::{ParamMap, ParamValue, RequestContext, ThrownError, UrlMappingsHolder};

#[derive(Parser)]
#[command(name = "url-mappings")]
#[command(about = "Inspect and exercise a URL mappings file", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "mappings.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List mappings in precedence order
    List,
    /// Match a request path
    Match {
        path: String,
        #[arg(long)]
        method: Option<String>,
        /// Return every matching mapping instead of the first
        #[arg(long)]
        all: bool,
    },
    /// Resolve a status code mapping
    Status {
        code: u16,
        /// Error type chain, most specific first
        #[arg(long = "exception")]
        exceptions: Vec<String>,
    },
    /// Build a URL from controller, action and parameters
    Reverse {
        #[arg(long)]
        controller: Option<String>,
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        method: Option<String>,
        /// Parameter as name=value; repeat a name for multiple values
        #[arg(long = "param")]
        params: Vec<String>,
        #[arg(long)]
        encoding: Option<String>,
        #[arg(long)]
        fragment: Option<String>,
        #[arg(long, default_value = "")]
        context_path: String,
        /// Omit the context path
        #[arg(long)]
        relative: bool,
    },
    /// Watch the mappings file and log reloads until interrupted
    Watch,
}

#[derive(Serialize)]
struct MappingRow {
    pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    target: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(&config.observability)?;

    tracing::info!(path = ?cli.config, mappings = config.mappings.len(), "Configuration loaded");

    match cli.command {
        Commands::List => {
            let holder = UrlMappingsHolder::from_config(&config)?;
            let rows: Vec<MappingRow> = holder
                .mappings()
                .iter()
                .map(|entry| MappingRow {
                    pattern: entry.pattern().to_string(),
                    method: entry.http_method().map(ToString::to_string),
                    name: entry.name().map(str::to_string),
                    target: entry.target().to_string(),
                })
                .chain(holder.status_mappings().iter().map(|mapping| MappingRow {
                    pattern: mapping.code().to_string(),
                    method: None,
                    name: mapping.exception().map(str::to_string),
                    target: mapping.target().to_string(),
                }))
                .collect();
            print_json(&rows)?;
        }
        Commands::Match { path, method, all } => {
            let holder = UrlMappingsHolder::from_config(&config)?;
            let method = method.as_deref().map(parse_method).transpose()?;
            let ctx = RequestContext::new(method.clone().unwrap_or_default());
            if all {
                let matches: Vec<_> = holder
                    .match_all(&path, method.as_ref())
                    .iter()
                    .map(|info| info.resolve(&ctx))
                    .collect();
                print_json(&matches)?;
            } else {
                match holder.match_path(&path) {
                    Some(info) => print_json(&info.resolve(&ctx))?,
                    None => print_json(&json!({ "matched": false, "path": path }))?,
                }
            }
        }
        Commands::Status { code, exceptions } => {
            let holder = UrlMappingsHolder::from_config(&config)?;
            let ctx = RequestContext::default();
            let info = match exceptions.split_first() {
                Some((thrown, ancestors)) => {
                    let error = ancestors
                        .iter()
                        .fold(ThrownError::new(thrown.as_str()), |e, a| e.with_ancestor(a.as_str()));
                    holder.match_status_code_for(code, &error)
                }
                None => holder.match_status_code(code),
            };
            match info {
                Some(info) => print_json(&info.resolve(&ctx))?,
                None => print_json(&json!({ "matched": false, "status": code }))?,
            }
        }
        Commands::Reverse {
            controller,
            action,
            method,
            params,
            encoding,
            fragment,
            context_path,
            relative,
        } => {
            let holder = UrlMappingsHolder::from_config(&config)?;
            let method = method.as_deref().map(parse_method).transpose()?;
            let mut params = parse_params(&params)?;
            let ctx = RequestContext::new(method.clone().unwrap_or_default()).with_context_path(context_path);

            let creator = holder.reverse_mapping(controller.as_deref(), action.as_deref(), method.as_ref(), &mut params);
            let url = if relative {
                creator.create_relative_url_for(
                    &ctx,
                    controller.as_deref(),
                    action.as_deref(),
                    &params,
                    encoding.as_deref(),
                    fragment.as_deref(),
                )?
            } else {
                creator.create_url_for(
                    &ctx,
                    controller.as_deref(),
                    action.as_deref(),
                    &params,
                    encoding.as_deref(),
                    fragment.as_deref(),
                )?
            };
            print_json(&json!({ "url": url }))?;
        }
        Commands::Watch => {
            let registry = Arc::new(MappingsRegistry::from_config(&config)?);
            let (watcher, updates) = ConfigWatcher::new(&cli.config);
            let _watcher = watcher.run()?;

            tracing::info!(mappings = registry.current().mappings().len(), "Watching for changes");
            let installed = run_reload_loop(Arc::clone(&registry), updates, wait_for_shutdown_signal()).await;
            tracing::info!(reloads = installed, "Shutdown complete");
        }
    }

    Ok(())
}

/// Parses `name=value` pairs; repeated names collect into a list.
fn parse_params(raw: &[String]) -> Result<ParamMap, Box<dyn std::error::Error>> {
    let mut params = ParamMap::new();
    for pair in raw {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("invalid --param '{}', expected name=value", pair))?;
        let merged = match params.remove(name) {
            Some(ParamValue::Single(first)) => ParamValue::Many(vec![first, value.to_string()]),
            Some(ParamValue::Many(mut values)) => {
                values.push(value.to_string());
                ParamValue::Many(values)
            }
            _ => ParamValue::from(value),
        };
        params.insert(name.to_string(), merged);
    }
    Ok(params)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

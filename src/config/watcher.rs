//! Mappings file watcher for hot reload.
//!
//! # Data Flow
//! ```text
//! notify event (modify/create)
//!     → settle: wait until the file has been quiet for the debounce window
//!     → read file → skip if the text is unchanged since the last table
//!     → parse + validate → compile UrlMappingsHolder
//!     → mpsc (only buildable tables are sent)
//! ```
//!
//! # Design Decisions
//! - One save often surfaces as several events (truncate, write, metadata);
//!   the whole burst produces a single rebuild
//! - A file that fails to parse or compile is logged and dropped; the
//!   receiver keeps whatever table it already has

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::loader::{parse_config, ConfigError};
use crate::routing::holder::UrlMappingsHolder;

/// Quiet period a burst of events must end with before the file is read.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the mappings file and publishes freshly compiled holders.
pub struct ConfigWatcher {
    path: PathBuf,
    debounce: Duration,
    update_tx: mpsc::UnboundedSender<UrlMappingsHolder>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for compiled holders.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<UrlMappingsHolder>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                debounce: DEFAULT_DEBOUNCE,
                update_tx,
            },
            update_rx,
        )
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Starts watching. Must be called from within a tokio runtime.
    ///
    /// The rebuild task ends when the returned watcher is dropped or the
    /// receiver goes away.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Mappings watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        let applied = fs::read_to_string(&self.path).ok();
        tracing::info!(path = ?self.path, debounce_ms = self.debounce.as_millis() as u64, "Mappings watcher started");
        tokio::spawn(self.rebuild_loop(event_rx, applied));
        Ok(watcher)
    }

    async fn rebuild_loop(self, mut events: mpsc::UnboundedReceiver<()>, mut applied: Option<String>) {
        while events.recv().await.is_some() {
            let mut burst = 1usize;
            loop {
                match timeout(self.debounce, events.recv()).await {
                    Ok(Some(())) => burst += 1,
                    Ok(None) | Err(_) => break,
                }
            }
            tracing::debug!(path = ?self.path, events = burst, "Mappings file settled");

            match rebuild(&self.path, applied.as_deref()) {
                Ok(Some((text, holder))) => {
                    tracing::info!(path = ?self.path, mappings = holder.mappings().len(), "Compiled new URL mappings");
                    applied = Some(text);
                    if self.update_tx.send(holder).is_err() {
                        return;
                    }
                }
                Ok(None) => tracing::debug!(path = ?self.path, "Mappings file unchanged, skipping rebuild"),
                Err(e) => tracing::error!(
                    path = ?self.path,
                    "Failed to rebuild URL mappings: {}. Keeping current mappings.",
                    e
                ),
            }
        }
    }
}

/// Reads and compiles the file, or `None` when its text matches `applied`.
fn rebuild(path: &Path, applied: Option<&str>) -> Result<Option<(String, UrlMappingsHolder)>, ConfigError> {
    let text = fs::read_to_string(path)?;
    if applied == Some(text.as_str()) {
        return Ok(None);
    }
    let config = parse_config(&text)?;
    let holder = UrlMappingsHolder::from_config(&config)?;
    Ok(Some((text, holder)))
}

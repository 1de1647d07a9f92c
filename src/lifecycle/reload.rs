//! Holder registry and hot reload.
//!
//! # Responsibilities
//! - Publish the current [`UrlMappingsHolder`] to readers
//! - Swap in each holder the watcher compiles, or build one from a config
//!
//! # Design Decisions
//! - Readers take a snapshot (`current()`) and keep it for the whole request;
//!   a concurrent reload never changes a snapshot already taken
//! - A new holder starts with empty caches; nothing is shared with the old one
//! - A configuration that fails to compile leaves the current holder in place
//! - The reload loop stops on any future the caller supplies (a signal in
//!   the CLI, a oneshot in tests)

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;

use crate::config::schema::MappingsConfig;
use crate::observability::metrics;
use crate::routing::error::UrlMappingResult;
use crate::routing::holder::UrlMappingsHolder;

/// Shared handle to the active mapping table.
#[derive(Debug)]
pub struct MappingsRegistry {
    current: ArcSwap<UrlMappingsHolder>,
}

impl MappingsRegistry {
    pub fn new(holder: UrlMappingsHolder) -> Self {
        Self {
            current: ArcSwap::from_pointee(holder),
        }
    }

    pub fn from_config(config: &MappingsConfig) -> UrlMappingResult<Self> {
        Ok(Self::new(UrlMappingsHolder::from_config(config)?))
    }

    /// The active holder.
    pub fn current(&self) -> Arc<UrlMappingsHolder> {
        self.current.load_full()
    }

    /// Rebuilds the holder from `config` and swaps it in.
    pub fn reload(&self, config: &MappingsConfig) -> UrlMappingResult<()> {
        match UrlMappingsHolder::from_config(config) {
            Ok(holder) => {
                self.install(holder);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to rebuild URL mappings: {}. Keeping current mappings.", e);
                metrics::record_reload("failure");
                Err(e)
            }
        }
    }

    /// Publishes an already compiled holder.
    pub fn install(&self, holder: UrlMappingsHolder) {
        tracing::info!(mappings = holder.mappings().len(), "URL mappings reloaded");
        self.current.store(Arc::new(holder));
        metrics::record_reload("success");
    }
}

/// Installs holders from the watcher until the channel closes or `shutdown`
/// resolves. Returns how many holders were installed.
pub async fn run_reload_loop<F>(
    registry: Arc<MappingsRegistry>,
    mut updates: mpsc::UnboundedReceiver<UrlMappingsHolder>,
    shutdown: F,
) -> usize
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut installed = 0;
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(holder) => {
                    registry.install(holder);
                    installed += 1;
                }
                None => break,
            },
            _ = &mut shutdown => {
                tracing::info!(installed, "Reload loop stopping");
                break;
            }
        }
    }
    installed
}

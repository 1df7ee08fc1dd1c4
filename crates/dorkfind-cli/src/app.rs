//! Application state management.

use anyhow::Context;
use dorkfind_core::{open_store, Config, HttpTransport, LocalTransport, RecordStore, SearchTransport};
use std::sync::Arc;
use tracing::info;

/// Shared application state.
pub struct App {
    /// Configuration
    pub config: Config,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: Config) -> Self {
        App { config }
    }

    /// Open the configured record store.
    pub fn store(&self) -> anyhow::Result<Arc<dyn RecordStore>> {
        let store = open_store(&self.config.store).context("Failed to open record store")?;
        info!(store = store.name(), "Record store opened");
        Ok(store)
    }

    /// Pick the transport a dispatcher should use.
    ///
    /// An explicit `endpoint` wins over `dispatch.endpoint`; with neither,
    /// searches run in-process against the configured store.
    pub fn transport(&self, endpoint: Option<&str>) -> anyhow::Result<Arc<dyn SearchTransport>> {
        let endpoint = endpoint
            .or(self.config.dispatch.endpoint.as_deref())
            .filter(|e| !e.is_empty());

        match endpoint {
            Some(url) => {
                info!(endpoint = url, "Searching through HTTP endpoint");
                Ok(Arc::new(HttpTransport::new(url, self.config.store.timeout())?))
            }
            None => Ok(Arc::new(LocalTransport::new(self.store()?))),
        }
    }
}

//! How the query dispatcher reaches the search endpoint.
//!
//! `SearchTransport` is the seam between the dispatcher and the endpoint:
//! `HttpTransport` calls a running server, `LocalTransport` calls
//! `search_dorks` in-process against a store.

use crate::endpoint::search_dorks;
use crate::error::{DorkError, Result};
use crate::store::RecordStore;
use crate::types::DorkRecord;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One search round-trip. Implementations block until the call completes.
pub trait SearchTransport: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<DorkRecord>>;
}

/// Calls the search endpoint in the same process.
pub struct LocalTransport {
    store: Arc<dyn RecordStore>,
}

impl LocalTransport {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        LocalTransport { store }
    }
}

impl SearchTransport for LocalTransport {
    fn search(&self, query: &str) -> Result<Vec<DorkRecord>> {
        search_dorks(self.store.as_ref(), Some(query))
    }
}

/// Calls `GET {base_url}/search?query=<text>` on a running server.
pub struct HttpTransport {
    client: Client,
    search_url: String,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DorkError::transport(e.to_string()))?;
        Ok(HttpTransport {
            client,
            search_url: format!("{}/search", base_url.trim_end_matches('/')),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

impl SearchTransport for HttpTransport {
    fn search(&self, query: &str) -> Result<Vec<DorkRecord>> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("query", query)])
            .send()
            .map_err(|e| DorkError::transport(e.to_string()))?;

        let status = response.status();
        debug!(%status, "Search endpoint responded");

        if status.is_success() {
            return response
                .json()
                .map_err(|e| DorkError::transport(format!("undecodable response: {}", e)));
        }

        let body = response.text().unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.to_string()
        } else {
            body.trim().to_string()
        };

        if status == StatusCode::BAD_REQUEST {
            Err(DorkError::invalid_request(message))
        } else {
            Err(DorkError::store_unavailable(message))
        }
    }
}

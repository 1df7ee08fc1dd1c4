//! PostgREST-backed record store.
//!
//! Queries `GET {url}/rest/v1/{table}?select=id,query,description&query=ilike.<pattern>`,
//! the REST surface hosted Postgres providers expose for a table.

use crate::config::StoreConfig;
use crate::error::{DorkError, Result};
use crate::search::SubstringPattern;
use crate::store::RecordStore;
use crate::types::DorkRecord;
use reqwest::blocking::Client;
use tracing::{debug, instrument, warn};

const SELECT_COLUMNS: &str = "id,query,description";

/// Record store reading a PostgREST table.
pub struct PostgrestStore {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl PostgrestStore {
    /// Create a store for `table` under the PostgREST service at `base_url`.
    pub fn new(client: Client, base_url: &str, table: &str, api_key: Option<String>) -> Self {
        PostgrestStore {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key,
        }
    }

    /// Build a store from the `[store]` configuration section.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DorkError::ConfigError {
                reason: "store.url is required for the postgrest store".to_string(),
            })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DorkError::ConfigError {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self::new(client, url, &config.table, config.api_key.clone()))
    }

    /// The table URL requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RecordStore for PostgrestStore {
    fn name(&self) -> &'static str {
        "postgrest"
    }

    #[instrument(skip(self, pattern), fields(needle_len = pattern.raw().len()))]
    fn search(&self, pattern: &SubstringPattern) -> Result<Vec<DorkRecord>> {
        let filter = format!("ilike.{}", postgrest_pattern(pattern));

        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[("select", SELECT_COLUMNS), ("query", filter.as_str())]);
        if let Some(ref key) = self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| DorkError::store_unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(%status, "PostgREST query failed");
            return Err(DorkError::store_unavailable(format!(
                "store returned {}: {}",
                status,
                body.trim()
            )));
        }

        let rows: Vec<DorkRecord> = response
            .json()
            .map_err(|e| DorkError::store_unavailable(format!("malformed store response: {}", e)))?;
        let fetched = rows.len();

        // The server-side filter can over-match (see postgrest_pattern).
        let matches: Vec<DorkRecord> = rows
            .into_iter()
            .filter(|r| pattern.matches_record(r))
            .collect();

        debug!(fetched, matched = matches.len(), "PostgREST search complete");
        Ok(matches)
    }
}

/// Render the `ilike` operand for PostgREST.
///
/// PostgREST rewrites every `*` to `%`, so a literal `*` cannot be sent. It is
/// replaced by the single-character wildcard `_` and the results are filtered
/// locally.
fn postgrest_pattern(pattern: &SubstringPattern) -> String {
    pattern.like_pattern().replace('*', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn spawn_responder(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{}", addr)
    }

    /// Search from a blocking thread, where the blocking client may live.
    async fn search_at(base_url: String, needle: &'static str) -> Result<Vec<DorkRecord>> {
        tokio::task::spawn_blocking(move || -> Result<Vec<DorkRecord>> {
            let config = StoreConfig {
                url: Some(base_url),
                api_key: Some("anon-key".to_string()),
                timeout_ms: 2000,
                ..StoreConfig::default()
            };
            let store = PostgrestStore::from_config(&config)?;
            store.search(&SubstringPattern::new(needle)?)
        })
        .await
        .unwrap()
    }

    #[test]
    fn test_postgrest_pattern() {
        let p = SubstringPattern::new("inurl:admin").unwrap();
        assert_eq!(postgrest_pattern(&p), "%inurl:admin%");

        let p = SubstringPattern::new("100%_done").unwrap();
        assert_eq!(postgrest_pattern(&p), "%100\\%\\_done%");

        let p = SubstringPattern::new("*.env").unwrap();
        assert_eq!(postgrest_pattern(&p), "%_.env%");
    }

    #[test]
    fn test_from_config_requires_url() {
        let config = StoreConfig::default();
        let err = PostgrestStore::from_config(&config).err().unwrap();
        assert!(matches!(err, DorkError::ConfigError { .. }));
    }

    #[test]
    fn test_endpoint_url() {
        let config = StoreConfig {
            url: Some("https://project.example.co/".to_string()),
            ..StoreConfig::default()
        };
        let store = PostgrestStore::from_config(&config).unwrap();
        assert_eq!(store.endpoint(), "https://project.example.co/rest/v1/dorks");
        assert_eq!(store.name(), "postgrest");
    }

    #[test]
    fn test_unreachable_store_is_unavailable() {
        let config = StoreConfig {
            url: Some("http://127.0.0.1:1".to_string()),
            timeout_ms: 500,
            ..StoreConfig::default()
        };
        let store = PostgrestStore::from_config(&config).unwrap();
        let err = store
            .search(&SubstringPattern::new("site").unwrap())
            .unwrap_err();
        assert!(matches!(err, DorkError::StoreUnavailable { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_over_matching_rows_are_filtered() {
        let seen: Arc<Mutex<Option<(String, String)>>> = Arc::default();
        let captured = Arc::clone(&seen);
        let router = Router::new().route(
            "/rest/v1/dorks",
            get(move |Query(params): Query<HashMap<String, String>>, headers: HeaderMap| {
                let captured = Arc::clone(&captured);
                async move {
                    let filter = params.get("query").cloned().unwrap_or_default();
                    let key = headers
                        .get("apikey")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *captured.lock() = Some((filter, key));

                    // What an unescaped `_` wildcard would let through.
                    Json(vec![
                        DorkRecord::new(1, "inurl:wp_admin", ""),
                        DorkRecord::new(2, "inurl:wp-admin", ""),
                        DorkRecord::new(3, "inurl:WP_ADMIN/login", ""),
                    ])
                }
            }),
        );
        let base_url = spawn_responder(router).await;

        let hits = search_at(base_url, "wp_admin").await.unwrap();
        let mut ids: Vec<u64> = hits.iter().map(|r| r.id.as_u64()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3]);

        let (filter, key) = seen.lock().clone().unwrap();
        assert_eq!(filter, "ilike.%wp\\_admin%");
        assert_eq!(key, "anon-key");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_status_is_unavailable() {
        let router = Router::new().route(
            "/rest/v1/dorks",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream down") }),
        );
        let base_url = spawn_responder(router).await;

        match search_at(base_url, "site").await.unwrap_err() {
            DorkError::StoreUnavailable { reason } => {
                assert!(reason.contains("503"));
                assert!(reason.contains("upstream down"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_table_is_unavailable() {
        let base_url = spawn_responder(Router::new()).await;

        let err = search_at(base_url, "site").await.unwrap_err();
        assert!(matches!(err, DorkError::StoreUnavailable { ref reason } if reason.contains("404")));
    }
}

//! Serve command - expose the search endpoint over HTTP.
//!
//! Routes:
//!
//! - `GET /search?query=<text>` - JSON array of matching records (200),
//!   plain-text message on a missing/empty query (400) or store failure (500)
//! - `GET /health` - liveness probe

use crate::app::App;
use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use dorkfind_core::{search_dorks, Config, DorkError, DorkRecord, RecordStore, SearchRequest};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Handler state: the read-only store shared by every request.
#[derive(Clone)]
pub struct ServerState {
    store: Arc<dyn RecordStore>,
}

impl ServerState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        ServerState { store }
    }
}

/// A `DorkError` rendered as a plain-text HTTP response.
pub struct ApiError(DorkError);

impl From<DorkError> for ApiError {
    fn from(err: DorkError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.0.user_message()).into_response()
    }
}

/// Build the HTTP router.
pub fn router(store: Arc<dyn RecordStore>) -> Router {
    Router::new()
        .route("/search", get(handle_search))
        .route("/health", get(handle_health))
        .with_state(ServerState::new(store))
}

pub async fn handle_search(
    State(state): State<ServerState>,
    Query(params): Query<SearchRequest>,
) -> Result<Json<Vec<DorkRecord>>, ApiError> {
    let start = Instant::now();
    let store = Arc::clone(&state.store);
    let query_len = params.query.as_ref().map_or(0, |q| q.len());

    let outcome = tokio::task::spawn_blocking(move || {
        search_dorks(store.as_ref(), params.query.as_deref())
    })
    .await
    .map_err(|e| DorkError::Internal(format!("search task failed: {}", e)))?;

    match outcome {
        Ok(records) => {
            info!(
                query_len,
                hits = records.len(),
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "GET /search"
            );
            Ok(Json(records))
        }
        Err(e) => {
            warn!(query_len, error = %e, "GET /search failed");
            Err(e.into())
        }
    }
}

async fn handle_health() -> &'static str {
    "ok"
}

/// Run the serve command.
pub fn run(config: Config, bind: Option<String>) -> anyhow::Result<()> {
    let app = App::new(config);
    let bind = bind.unwrap_or_else(|| app.config.server.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", bind))?;

    // Stores may own blocking clients, so they are opened outside the runtime.
    let store = app.store()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(addr, Arc::clone(&store)))
}

async fn serve(addr: SocketAddr, store: Arc<dyn RecordStore>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, store = store.name(), "Search endpoint listening");

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Search endpoint stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use dorkfind_core::{HttpTransport, MemoryStore, QueryDispatcher, SearchTransport, SubstringPattern};
    use std::time::Duration;

    struct DownStore;

    impl RecordStore for DownStore {
        fn name(&self) -> &'static str {
            "down"
        }

        fn search(&self, _pattern: &SubstringPattern) -> dorkfind_core::Result<Vec<DorkRecord>> {
            Err(DorkError::store_unavailable("connection refused"))
        }
    }

    fn state() -> ServerState {
        let store = MemoryStore::from_records(vec![
            DorkRecord::new(1, "SiteSearch", "Internal search pages"),
            DorkRecord::new(2, "inurl:phpinfo.php", "PHP info pages"),
        ])
        .unwrap();
        ServerState::new(Arc::new(store))
    }

    /// Serve the router on an ephemeral local port and return its base URL.
    async fn spawn_server(store: Arc<dyn RecordStore>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router(store)).await.unwrap() });
        format!("http://{}", addr)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_search_ok() {
        let response = handle_search(State(state()), Query(SearchRequest::new("site")))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let records: Vec<DorkRecord> = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(records, vec![DorkRecord::new(1, "SiteSearch", "Internal search pages")]);
    }

    #[tokio::test]
    async fn test_search_no_match_is_empty_array() {
        let response = handle_search(State(state()), Query(SearchRequest::new("xyz")))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "[]");
    }

    #[tokio::test]
    async fn test_missing_query_is_bad_request() {
        let response = handle_search(State(state()), Query(SearchRequest::default()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(body_text(response).await, "Query parameter is required");
    }

    #[tokio::test]
    async fn test_empty_query_is_bad_request() {
        let response = handle_search(State(state()), Query(SearchRequest::new("")))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_failure_is_server_error() {
        let state = ServerState::new(Arc::new(DownStore));
        let response = handle_search(State(state), Query(SearchRequest::new("site")))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "connection refused");
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(handle_health().await, "ok");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_http_transport_against_server() {
        let base_url = spawn_server(state().store).await;

        let (hits, err) = tokio::task::spawn_blocking(move || {
            let transport = HttpTransport::new(&base_url, Duration::from_secs(2)).unwrap();
            (
                transport.search("PHPINFO").unwrap(),
                transport.search("").unwrap_err(),
            )
        })
        .await
        .unwrap();

        assert_eq!(hits, vec![DorkRecord::new(2, "inurl:phpinfo.php", "PHP info pages")]);
        match err {
            DorkError::InvalidRequest { reason } => assert_eq!(reason, "Query parameter is required"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_server_error_body_reaches_dispatcher() {
        let base_url = spawn_server(Arc::new(DownStore)).await;

        let (err, shown) = tokio::task::spawn_blocking(move || {
            let transport = Arc::new(HttpTransport::new(&base_url, Duration::from_secs(2)).unwrap());
            let err = transport.search("site").unwrap_err();

            let mut dispatcher = QueryDispatcher::new(transport, Duration::from_millis(10));
            let start = Instant::now();
            dispatcher.on_input_at("site", start);
            dispatcher.tick_at(start + Duration::from_millis(10));
            let give_up = Instant::now() + Duration::from_secs(5);
            while dispatcher.state().is_loading() && Instant::now() < give_up {
                dispatcher.wait_for_response(Duration::from_millis(50));
            }
            (err, dispatcher.state().error().map(str::to_string))
        })
        .await
        .unwrap();

        assert!(matches!(err, DorkError::StoreUnavailable { .. }));
        assert_eq!(shown.as_deref(), Some("connection refused"));
    }
}

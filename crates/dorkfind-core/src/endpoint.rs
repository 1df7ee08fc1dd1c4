//! The search endpoint: validate a query, ask the store, normalize failures.
//!
//! This is transport-agnostic. The HTTP server wraps it in a route handler
//! and `LocalTransport` calls it directly. Each call is independent; nothing
//! is cached between calls.

use crate::error::{DorkError, Result};
use crate::search::SubstringPattern;
use crate::store::RecordStore;
use crate::types::DorkRecord;
use std::time::Instant;
use tracing::{debug, warn};

/// Look up the records whose `query` field contains `query`, ignoring case.
///
/// - a missing or empty `query` fails with `InvalidRequest` before the store
///   is touched
/// - any store failure is reported as `StoreUnavailable` carrying only a
///   message
pub fn search_dorks(store: &dyn RecordStore, query: Option<&str>) -> Result<Vec<DorkRecord>> {
    let pattern = match query {
        Some(text) => SubstringPattern::new(text)?,
        None => return Err(DorkError::invalid_request("Query parameter is required")),
    };

    let start = Instant::now();
    let records = store.search(&pattern).map_err(|e| {
        warn!(store = store.name(), error = %e, "Record store search failed");
        match e {
            DorkError::StoreUnavailable { .. } => e,
            other => DorkError::store_unavailable(other.to_string()),
        }
    })?;

    debug!(
        store = store.name(),
        hits = records.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Search served"
    );
    Ok(records)
}

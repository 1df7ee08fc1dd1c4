//! # Dorkfind Core Library
//!
//! This crate provides the search pipeline behind Dorkfind: record stores,
//! the stateless search endpoint, and the client-side query dispatcher that
//! turns keystrokes into a minimal, race-safe sequence of searches.
//!
//! ## Architecture
//!
//! - **Types** (`types`): `DorkRecord` and request parameters
//! - **Search** (`search`): literal, case-insensitive substring patterns
//! - **Store** (`store`, `postgrest`): the `RecordStore` trait and its backends
//! - **Endpoint** (`endpoint`): validation and error normalization for a search
//! - **Transport** (`transport`): how a dispatcher reaches the endpoint
//! - **Dispatch** (`dispatch`): debounce and stale-response suppression
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```rust,ignore
//! use dorkfind_core::{DorkRecord, LocalTransport, MemoryStore, QueryDispatcher};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let store = MemoryStore::from_records(vec![DorkRecord::new(1, "SiteSearch", "")])?;
//! let transport = Arc::new(LocalTransport::new(Arc::new(store)));
//! let mut dispatcher = QueryDispatcher::new(transport, Duration::from_millis(500));
//!
//! dispatcher.on_input("site");
//! // ... on every event-loop iteration:
//! dispatcher.tick();
//! for record in dispatcher.state().results() {
//!     println!("{}", record.query);
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod postgrest;
pub mod search;
pub mod store;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::{Config, StoreKind};
pub use dispatch::{Dispatch, DispatchState, Phase, QueryDispatcher};
pub use endpoint::search_dorks;
pub use error::{DorkError, Result};
pub use postgrest::PostgrestStore;
pub use search::SubstringPattern;
pub use store::{open_store, MemoryStore, RecordStore};
pub use transport::{HttpTransport, LocalTransport, SearchTransport};
pub use types::{DorkId, DorkRecord, SearchRequest};

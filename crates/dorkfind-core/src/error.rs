//! Error types for Dorkfind core operations.
//!
//! This module defines well-structured error types using `thiserror` for
//! library-level errors, while the binary uses `anyhow` for convenient error
//! handling.

use thiserror::Error;

/// Result type alias using DorkError
pub type Result<T> = std::result::Result<T, DorkError>;

/// Message shown when a dispatched search never completed.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Failed to fetch results";

/// Core error types for Dorkfind operations.
///
/// The first three variants make up the search taxonomy: callers map them to
/// a response status (server side) or to an inline message (client side).
#[derive(Error, Debug)]
pub enum DorkError {
    // === Search Errors ===
    /// The request carried no usable query text
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The record store could not answer
    #[error("record store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// The search call never reached or returned from the endpoint
    #[error("transport failure: {reason}")]
    TransportFailure { reason: String },

    // === Record Errors ===
    /// A record cannot be stored (empty query, duplicate id)
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    // === Configuration Errors ===
    /// Configuration file parsing failed
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// Serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    // === Internal Errors ===
    /// Internal error that should not happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl DorkError {
    /// Returns true if the caller sent something unusable (HTTP 4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, DorkError::InvalidRequest { .. })
    }

    /// Returns true if repeating the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DorkError::StoreUnavailable { .. } | DorkError::TransportFailure { .. } | DorkError::Io(_)
        )
    }

    /// The message shown to a user or written into a plain-text error body.
    ///
    /// Only the reason string is exposed; the variant structure stays internal.
    pub fn user_message(&self) -> String {
        match self {
            DorkError::InvalidRequest { reason } | DorkError::StoreUnavailable { reason } => {
                reason.clone()
            }
            DorkError::TransportFailure { .. } => TRANSPORT_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Create an invalid-request error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        DorkError::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Create a store-unavailable error
    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        DorkError::StoreUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a transport failure
    pub fn transport(reason: impl Into<String>) -> Self {
        DorkError::TransportFailure {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DorkError {
    fn from(err: serde_json::Error) -> Self {
        DorkError::Serialization(err.to_string())
    }
}

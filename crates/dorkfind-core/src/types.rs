//! Core data types for Dorkfind.
//!
//! These types travel over the wire unchanged: the search endpoint returns
//! `DorkRecord`s as a JSON array and the dispatcher decodes the same shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of a dork record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DorkId(pub u64);

impl DorkId {
    /// Create a new record ID
    pub fn new(id: u64) -> Self {
        DorkId(id)
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DorkId {
    fn from(id: u64) -> Self {
        DorkId(id)
    }
}

/// A stored dork: a search-pattern string plus a human-readable description.
///
/// Records are read-only from the search system's point of view. Creation,
/// mutation and deletion belong to whichever store holds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DorkRecord {
    /// Unique identifier assigned by the store
    pub id: DorkId,

    /// The dork pattern itself (e.g. `intitle:"index of" passwd`)
    pub query: String,

    /// Free-text description, may be empty
    #[serde(default)]
    pub description: String,
}

impl DorkRecord {
    /// Create a new record
    pub fn new(id: impl Into<DorkId>, query: impl Into<String>, description: impl Into<String>) -> Self {
        DorkRecord {
            id: id.into(),
            query: query.into(),
            description: description.into(),
        }
    }
}

/// Query-string parameters of a search request (`?query=<text>`).
///
/// `query` stays optional so a missing parameter reaches the endpoint and is
/// rejected there, the same way an empty one is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        SearchRequest {
            query: Some(query.into()),
        }
    }
}

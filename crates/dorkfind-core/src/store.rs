//! Record store abstraction.
//!
//! The search endpoint talks to records only through `RecordStore`, whose
//! single capability is "find records whose `query` field contains this text,
//! ignoring case". Stores decide how to evaluate that, but must return literal
//! containment results for the given `SubstringPattern`.
//!
//! Two implementations ship with the crate:
//!
//! - `MemoryStore`: records held in memory, optionally seeded from JSON
//! - `PostgrestStore`: a remote table queried over PostgREST

use crate::config::{StoreConfig, StoreKind};
use crate::error::{DorkError, Result};
use crate::postgrest::PostgrestStore;
use crate::search::{filter_records, SubstringPattern};
use crate::types::{DorkId, DorkRecord};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Read-only search capability over dork records.
pub trait RecordStore: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Find every record whose `query` contains `pattern`, case-insensitive.
    ///
    /// The order of the returned records is unspecified.
    fn search(&self, pattern: &SubstringPattern) -> Result<Vec<DorkRecord>>;
}

/// Default record count above which `MemoryStore` scans with rayon.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// In-memory record store.
///
/// Concurrent searches share a read lock; seeding takes the write lock.
pub struct MemoryStore {
    records: RwLock<Vec<DorkRecord>>,
    parallel_threshold: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemoryStore {
            records: RwLock::new(Vec::new()),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Create a store holding `records`.
    ///
    /// Fails if a record has an empty query or two records share an id.
    pub fn from_records(records: Vec<DorkRecord>) -> Result<Self> {
        validate_records(&records)?;
        Ok(MemoryStore {
            records: RwLock::new(records),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        })
    }

    /// Load records from a JSON file containing an array of records.
    pub fn load_json(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let records: Vec<DorkRecord> = serde_json::from_str(&contents)?;
        info!(path = %path.display(), records = records.len(), "Loaded seed records");
        Self::from_records(records)
    }

    /// Set the record count above which searches run in parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Add a record, rejecting duplicate ids and empty queries.
    pub fn insert(&self, record: DorkRecord) -> Result<()> {
        check_query(&record)?;
        let mut records = self.records.write();
        if records.iter().any(|r| r.id == record.id) {
            return Err(duplicate_id(&record));
        }
        records.push(record);
        Ok(())
    }

    /// Get the number of records in the store.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    #[instrument(skip(self, pattern), fields(needle_len = pattern.raw().len()))]
    fn search(&self, pattern: &SubstringPattern) -> Result<Vec<DorkRecord>> {
        let records = self.records.read();

        let matches: Vec<DorkRecord> = if records.len() >= self.parallel_threshold {
            records
                .par_iter()
                .filter(|r| pattern.matches_record(r))
                .cloned()
                .collect()
        } else {
            filter_records(records.iter(), pattern)
        };

        debug!(scanned = records.len(), matched = matches.len(), "Memory search complete");
        Ok(matches)
    }
}

fn validate_records(records: &[DorkRecord]) -> Result<()> {
    let mut seen: HashSet<DorkId> = HashSet::with_capacity(records.len());
    for record in records {
        check_query(record)?;
        if !seen.insert(record.id) {
            return Err(duplicate_id(record));
        }
    }
    Ok(())
}

fn check_query(record: &DorkRecord) -> Result<()> {
    if record.query.is_empty() {
        return Err(DorkError::InvalidRecord {
            reason: format!("record {} has an empty query", record.id),
        });
    }
    Ok(())
}

fn duplicate_id(record: &DorkRecord) -> DorkError {
    DorkError::InvalidRecord {
        reason: format!("duplicate record id {}", record.id),
    }
}

/// Open the store described by `config`.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    match config.kind {
        StoreKind::Memory => {
            let store = match config.seed_path {
                Some(ref path) => MemoryStore::load_json(path)?,
                None => MemoryStore::new(),
            };
            Ok(Arc::new(store.with_parallel_threshold(config.parallel_threshold)))
        }
        StoreKind::Postgrest => Ok(Arc::new(PostgrestStore::from_config(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_records() -> Vec<DorkRecord> {
        vec![
            DorkRecord::new(1, "SiteSearch", "Internal site search pages"),
            DorkRecord::new(2, "intitle:\"index of\" backup", "Open directory listings"),
            DorkRecord::new(3, "site:gov filetype:pdf", ""),
        ]
    }

    fn ids(records: &[DorkRecord]) -> Vec<u64> {
        let mut ids: Vec<u64> = records.iter().map(|r| r.id.as_u64()).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_memory_search() {
        let store = MemoryStore::from_records(sample_records()).unwrap();

        let hits = store.search(&SubstringPattern::new("site").unwrap()).unwrap();
        assert_eq!(ids(&hits), vec![1, 3]);

        let hits = store.search(&SubstringPattern::new("xyz").unwrap()).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = MemoryStore::from_records(sample_records()).unwrap();
        let parallel = MemoryStore::from_records(sample_records())
            .unwrap()
            .with_parallel_threshold(0);

        let pattern = SubstringPattern::new("INDEX").unwrap();
        assert_eq!(
            ids(&sequential.search(&pattern).unwrap()),
            ids(&parallel.search(&pattern).unwrap())
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut records = sample_records();
        records.push(DorkRecord::new(1, "inurl:login", ""));
        let err = MemoryStore::from_records(records).err().unwrap();
        assert!(matches!(err, DorkError::InvalidRecord { .. }));

        let store = MemoryStore::from_records(sample_records()).unwrap();
        let err = store.insert(DorkRecord::new(2, "inurl:admin", "")).unwrap_err();
        assert!(matches!(err, DorkError::InvalidRecord { .. }));
        assert!(store.insert(DorkRecord::new(4, "inurl:admin", "")).is_ok());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_empty_query_rejected() {
        let records = vec![DorkRecord::new(1, "", "nothing")];
        let err = MemoryStore::from_records(records).err().unwrap();
        assert!(matches!(err, DorkError::InvalidRecord { .. }));

        let store = MemoryStore::new();
        let err = store.insert(DorkRecord::new(1, "", "")).unwrap_err();
        assert!(matches!(err, DorkError::InvalidRecord { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dorks.json");
        fs::write(&path, serde_json::to_string(&sample_records()).unwrap()).unwrap();

        let store = MemoryStore::load_json(&path).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_open_memory_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dorks.json");
        fs::write(&path, serde_json::to_string(&sample_records()).unwrap()).unwrap();

        let config = StoreConfig {
            seed_path: Some(path),
            ..StoreConfig::default()
        };
        let store = open_store(&config).unwrap();
        assert_eq!(store.name(), "memory");

        let hits = store.search(&SubstringPattern::new("filetype").unwrap()).unwrap();
        assert_eq!(ids(&hits), vec![3]);
    }
}

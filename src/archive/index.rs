//! Lookup from (URL, method) to recorded entries.
//!
//! # Design Decisions
//! - Keys compare by exact string equality; no scheme, slash or query
//!   normalization
//! - Buckets keep capture order; nothing is dropped or deduplicated
//! - Built once per load and never mutated afterwards
//! - Takes ownership of the entries; the index is their only copy

use std::collections::HashMap;

use crate::archive::model::Entry;

/// Index key: destination URL and HTTP method, both verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub url: String,
    pub method: String,
}

impl IndexKey {
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
        }
    }
}

/// Immutable lookup structure over an archive's entries.
#[derive(Debug, Default)]
pub struct ArchiveIndex {
    buckets: HashMap<IndexKey, Vec<Entry>>,
    entry_count: usize,
}

impl ArchiveIndex {
    /// Build the index in one pass over the entries, preserving capture order.
    pub fn build(entries: Vec<Entry>) -> Self {
        let entry_count = entries.len();
        let mut buckets: HashMap<IndexKey, Vec<Entry>> = HashMap::new();

        for entry in entries {
            let key = IndexKey::new(&entry.request.url, &entry.request.method);
            buckets.entry(key).or_default().push(entry);
        }

        Self {
            buckets,
            entry_count,
        }
    }

    /// Entries recorded for exactly this URL and method, in capture order.
    pub fn lookup(&self, url: &str, method: &str) -> Option<&[Entry]> {
        self.buckets
            .get(&IndexKey::new(url, method))
            .map(Vec::as_slice)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of indexed entries across all keys.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn keys(&self) -> impl Iterator<Item = &IndexKey> {
        self.buckets.keys()
    }
}

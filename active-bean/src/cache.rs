//! # Lookup Cache Module
//!
//! Memoizes resolved single-row lookups, including "not found" results.
//! Keys are SHA-256 digests of the table, the canonical predicate and the
//! bound values, so identical lookups always share a key.

use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use crate::{Error, Record, Selector, Value};

// ============================================================================
// Cache Entry
// ============================================================================

/// A memoized lookup result.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    Found(Record),
    Missing,
}

impl CacheEntry {
    pub fn into_record(self) -> Option<Record> {
        match self {
            CacheEntry::Found(record) => Some(record),
            CacheEntry::Missing => None,
        }
    }
}

impl From<Option<Record>> for CacheEntry {
    fn from(record: Option<Record>) -> Self {
        record.map_or(CacheEntry::Missing, CacheEntry::Found)
    }
}

// ============================================================================
// LookupCache Trait
// ============================================================================

/// Storage backend for memoized lookups.
pub trait LookupCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, Error>;
    fn set(&self, key: &str, entry: CacheEntry) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Process-scoped, unbounded cache with no expiry.
///
/// Writes made through `save()` refresh the saved record's own key only;
/// other entries for the same table may go stale.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> Result<(), Error> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry>>, Error> {
        self.entries.lock().map_err(|_| {
            log::error!("lookup cache lock poisoned");
            Error::LockPoisoned
        })
    }
}

impl LookupCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, entry: CacheEntry) -> Result<(), Error> {
        self.lock()?.insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ============================================================================
// Cache Keys
// ============================================================================

/// Computes the lookup key of `selector` on `table`.
///
/// Every part is length-prefixed and every value tagged, so two distinct
/// (table, predicate, values) triples never hash the same input.
pub fn cache_key(table: &str, selector: &Selector) -> String {
    let mut hasher = Sha256::new();
    write_str(&mut hasher, table);
    write_str(&mut hasher, &selector.predicate());

    write_u32(&mut hasher, selector.values().len());
    for value in selector.values() {
        write_value(&mut hasher, value);
    }

    format!("{:x}", hasher.finalize())
}

fn write_u32(hasher: &mut Sha256, n: usize) {
    hasher.update((n as u32).to_be_bytes());
}

fn write_str(hasher: &mut Sha256, s: &str) {
    write_u32(hasher, s.len());
    hasher.update(s.as_bytes());
}

fn write_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update([0x00]),
        Value::Bool(v) => hasher.update([0x01, u8::from(*v)]),
        Value::Int(v) => {
            hasher.update([0x02]);
            hasher.update(v.to_be_bytes());
        }
        Value::Float(v) => {
            hasher.update([0x03]);
            hasher.update(v.to_bits().to_be_bytes());
        }
        Value::Text(v) => {
            hasher.update([0x04]);
            write_str(hasher, v);
        }
    }
}

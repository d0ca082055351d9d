//! # Schema Cache Module
//!
//! Remembers each table's field list after the first introspection. Entries
//! are never invalidated: the schema is assumed stable for the lifetime of
//! the cache.

use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::{Error, Store};

/// Per-table field-name cache.
#[derive(Debug, Default)]
pub struct SchemaCache {
    tables: Mutex<HashMap<String, Vec<String>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fields of `table`, introspecting `store` on first use.
    ///
    /// The lock is held across introspection, so each table is populated at
    /// most once even under concurrent callers. A table the store does not
    /// know yields an empty list.
    pub async fn fields(&self, store: &dyn Store, table: &str) -> Result<Vec<String>, Error> {
        let mut tables = self.tables.lock().await;
        if let Some(fields) = tables.get(table) {
            return Ok(fields.clone());
        }

        let fields = if store.inspect_all_tables().await?.iter().any(|t| t == table) {
            store.inspect_table_fields(table).await?
        } else {
            Vec::new()
        };

        log::debug!("schema of `{}` cached with {} fields", table, fields.len());
        tables.insert(table.to_string(), fields.clone());
        Ok(fields)
    }

    /// Returns `true` if `table` has already been introspected.
    pub async fn contains(&self, table: &str) -> bool {
        self.tables.lock().await.contains_key(table)
    }
}

//! # Database Module
//!
//! The handle that ties a [`Store`], a [`LookupCache`] and a [`SchemaCache`]
//! together. It is injected into every [`ActiveRecord`]; nothing in Active
//! Bean holds a global connection.

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{fmt, sync::Arc};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    cache::{cache_key, LookupCache, MemoryCache},
    ActiveRecord, Entity, Error, Record, SchemaCache, Selector, SqlStore, Store,
};

// ============================================================================
// Database Struct
// ============================================================================

/// The main entry point for Active Bean.
///
/// Cheap to clone and safe to share across tasks: the store, the lookup cache
/// and the schema cache are all behind `Arc`s.
#[derive(Clone)]
pub struct Database {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) cache: Arc<dyn LookupCache>,
    pub(crate) schema: Arc<SchemaCache>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("schema", &self.schema).finish_non_exhaustive()
    }
}

impl Database {
    /// Creates a new DatabaseBuilder for configuring the connection.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Connects to a SQL database using the provided connection string.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        DatabaseBuilder::new().connect(url).await
    }

    /// Wraps an already constructed store with a fresh in-memory cache.
    pub fn with_store(store: Arc<dyn Store>) -> Self {
        DatabaseBuilder::new().build(store)
    }

    /// Wraps `entity` so it can load and persist itself.
    pub fn active<E: Entity>(&self, entity: E) -> ActiveRecord<E> {
        ActiveRecord::new(self.clone(), entity)
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn cache(&self) -> &dyn LookupCache {
        self.cache.as_ref()
    }

    pub fn schema(&self) -> &SchemaCache {
        &self.schema
    }

    /// Looks up one record, consulting the cache before the store.
    ///
    /// Returns the lookup key with the result; misses are cached too.
    pub(crate) async fn find(&self, table: &str, selector: &Selector) -> Result<(String, Option<Record>), Error> {
        let key = cache_key(table, selector);

        if let Some(entry) = self.cache.get(&key)? {
            log::debug!("cache hit on `{}` for `{}`", table, selector.predicate());
            return Ok((key, entry.into_record()));
        }

        log::debug!("cache miss on `{}` for `{}` {:?}", table, selector.predicate(), selector.values());
        let record = self.store.find_one(table, selector).await?;
        self.cache.set(&key, record.clone().into())?;
        Ok((key, record))
    }

    /// Field names of `table`, introspected once and then cached.
    pub(crate) async fn fields(&self, table: &str) -> Result<Vec<String>, Error> {
        self.schema.fields(self.store.as_ref(), table).await
    }

    /// Closes the underlying store connection.
    pub async fn close(&self) -> Result<(), Error> {
        self.store.close().await
    }
}

// ============================================================================
// DatabaseBuilder Struct
// ============================================================================

/// Configures a [`Database`] before connecting.
pub struct DatabaseBuilder {
    max_connections: u32,
    cache: Option<Arc<dyn LookupCache>>,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self { max_connections: 5, cache: None }
    }

    /// Maximum number of pooled SQL connections (default 5).
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Replaces the default [`MemoryCache`] with another lookup cache.
    pub fn cache(mut self, cache: Arc<dyn LookupCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Connects a [`SqlStore`] and builds the database around it.
    pub async fn connect(self, url: &str) -> Result<Database, Error> {
        let store = SqlStore::connect_with(url, self.max_connections).await?;
        Ok(self.build(Arc::new(store)))
    }

    /// Builds the database around an injected store.
    pub fn build(self, store: Arc<dyn Store>) -> Database {
        Database {
            store,
            cache: self.cache.unwrap_or_else(|| Arc::new(MemoryCache::new())),
            schema: Arc::new(SchemaCache::new()),
        }
    }
}

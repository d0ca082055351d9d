//! # Active Bean
//!
//! A convention-driven active record layer built on top of sqlx.
//!
//! An entity derives [`Entity`], gets wrapped by [`Database::active`], and
//! then loads, upserts and persists itself through operations whose names
//! describe the lookup:
//!
//! ```rust,ignore
//! use active_bean::{Database, Entity};
//!
//! #[derive(Entity)]
//! struct Test {
//!     int_value: i32,
//!     string_value: String,
//! }
//!
//! let db = Database::connect("sqlite::memory:").await?;
//! let mut test = db.active(Test { int_value: 666, string_value: "test".into() });
//!
//! // SELECT * FROM "test" WHERE "intValue" = ? AND "stringValue" = ? LIMIT 1
//! test.upsert_by("IntValue_and_StringValue", &[]).await?.prepare()?.save().await?;
//! ```
//!
//! Lookups go through a [`LookupCache`] before reaching the [`Store`], and
//! table schemas are introspected once per [`SchemaCache`].

// ============================================================================
// Modules
// ============================================================================

pub mod active_record;
pub mod cache;
pub mod database;
pub mod entity;
pub mod error;
pub mod expression;
pub mod materializer;
pub mod memory_store;
pub mod naming;
pub mod operation;
pub mod record;
pub mod schema;
pub mod selector;
pub mod sql_store;
pub mod store;
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use active_bean_macro::{BeanEnum, Entity};

#[doc(hidden)]
pub use serde_json;

pub use active_record::{ActiveRecord, Argument, Lifecycle, Outcome};
pub use cache::{CacheEntry, LookupCache, MemoryCache};
pub use database::{Database, DatabaseBuilder};
pub use entity::{Entity, PropertyInfo};
pub use error::{Error, StoreError};
pub use expression::{Combinator, FieldExpression, OrderBy};
pub use materializer::FieldMap;
pub use memory_store::MemoryStore;
pub use operation::{Operation, Verb};
pub use record::{Record, RelationKind, RelationList};
pub use schema::SchemaCache;
pub use selector::Selector;
pub use sql_store::{Drivers, SqlStore};
pub use store::Store;
pub use value::{Json, ToValue, Value};

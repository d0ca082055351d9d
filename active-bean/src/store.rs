//! # Store Module
//!
//! The record store collaborator consumed by the active record layer.
//! [`SqlStore`](crate::SqlStore) talks to a real database through sqlx;
//! [`MemoryStore`](crate::MemoryStore) keeps everything in process.

use async_trait::async_trait;

use crate::{Error, Record, Selector};

/// A generic relational record store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts or updates `record` (and its pending relation items) and
    /// returns its id. The id is also written back into the record.
    async fn store(&self, record: &mut Record) -> Result<i64, Error>;

    /// Lists the tables of the store.
    async fn inspect_all_tables(&self) -> Result<Vec<String>, Error>;

    /// Lists the fields of `table`, or nothing if the table does not exist.
    async fn inspect_table_fields(&self, table: &str) -> Result<Vec<String>, Error>;

    /// Finds the first record of `table` matching `selector`.
    async fn find_one(&self, table: &str, selector: &Selector) -> Result<Option<Record>, Error>;

    /// Creates a new, unsaved record bound to `table`.
    fn dispense(&self, table: &str) -> Record {
        Record::new(table)
    }

    /// Closes the underlying connection.
    async fn close(&self) -> Result<(), Error>;
}

/// Name of the column holding a parent's id in an owned relation item.
pub(crate) fn parent_column(parent_table: &str) -> String {
    format!("{}_id", parent_table)
}

/// Name of the link table joining two cross-related tables, e.g.
/// `book` and `tag` -> `book_tag`.
pub(crate) fn link_table(a: &str, b: &str) -> String {
    if a <= b { format!("{}_{}", a, b) } else { format!("{}_{}", b, a) }
}

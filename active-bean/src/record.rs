//! # Record Module
//!
//! The generic, untyped row ("bean") exchanged with a [`Store`](crate::Store).
//! A record knows its table, its id once persisted, its fields in insertion
//! order and the relation items appended since the last write.

use indexmap::IndexMap;

use crate::Value;

// ============================================================================
// Relation Kind
// ============================================================================

/// How a relation list is owned by its parent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// One-to-many: items carry a `<parent>_id` column.
    Own,
    /// Many-to-many: items are linked through a `<a>_<b>` link table.
    Cross,
}

impl RelationKind {
    /// The list key prefix used by the bean naming convention.
    pub fn prefix(self) -> &'static str {
        match self {
            RelationKind::Own => "own",
            RelationKind::Cross => "xown",
        }
    }

    /// Builds the list key for a relation suffix, e.g. `Book` -> `ownBookList`.
    pub fn list_key(self, suffix: &str) -> String {
        format!("{}{}List", self.prefix(), suffix)
    }
}

/// Items appended to one relation list that have not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationList {
    pub kind: RelationKind,
    pub items: Vec<Record>,
}

// ============================================================================
// Record Struct
// ============================================================================

/// A row of a store table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: String,
    id: Option<i64>,
    fields: IndexMap<String, Value>,
    lists: IndexMap<String, RelationList>,
}

impl Record {
    /// Creates an empty, unsaved record for a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), id: None, fields: IndexMap::new(), lists: IndexMap::new() }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The primary key, `None` until the record has been stored.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Builder-style variant of [`Record::set`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Appends an item to the `own<Suffix>List` or `xown<Suffix>List` list.
    pub fn append(&mut self, kind: RelationKind, suffix: &str, item: Record) {
        self.lists
            .entry(kind.list_key(suffix))
            .or_insert_with(|| RelationList { kind, items: Vec::new() })
            .items
            .push(item);
    }

    pub fn list(&self, key: &str) -> Option<&RelationList> {
        self.lists.get(key)
    }

    pub fn lists(&self) -> &IndexMap<String, RelationList> {
        &self.lists
    }

    /// Removes the pending relation items so a store can write them.
    pub fn take_lists(&mut self) -> IndexMap<String, RelationList> {
        std::mem::take(&mut self.lists)
    }

    /// Puts back the items a store could not write, ahead of anything
    /// appended since they were taken.
    pub fn restore_lists(&mut self, lists: IndexMap<String, RelationList>) {
        for (key, mut list) in lists {
            if list.items.is_empty() {
                continue;
            }
            match self.lists.get_mut(&key) {
                Some(current) => {
                    list.items.append(&mut current.items);
                    current.items = list.items;
                }
                None => {
                    self.lists.insert(key, list);
                }
            }
        }
    }
}

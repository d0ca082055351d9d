//! # Memory Store Module
//!
//! An in-process [`Store`] with the same fluid-schema behaviour as
//! [`SqlStore`](crate::SqlStore): tables and columns appear on first write.
//! It counts calls and can be told to fail writes, which makes it the store
//! of choice for exercising the active record lifecycle in tests.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::{
    cmp::Ordering,
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering},
        Mutex, MutexGuard,
    },
};

use crate::{
    record::{RelationKind, RelationList},
    store::{link_table, parent_column},
    Error, Record, Selector, Store, StoreError, Value,
};

#[derive(Debug)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
    next_id: i64,
}

impl Table {
    fn new() -> Self {
        Self { columns: vec!["id".to_string()], rows: Vec::new(), next_id: 1 }
    }
}

/// In-memory record store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<IndexMap<String, Table>>,
    rejected_tables: Mutex<HashSet<String>>,
    store_calls: AtomicUsize,
    find_calls: AtomicUsize,
    table_inspections: AtomicUsize,
    field_inspections: AtomicUsize,
    fail_writes: AtomicBool,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `store` calls so far, failed ones included.
    pub fn store_calls(&self) -> usize {
        self.store_calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of `find_one` calls so far.
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of `inspect_all_tables` calls so far.
    pub fn table_inspections(&self) -> usize {
        self.table_inspections.load(AtomicOrdering::SeqCst)
    }

    /// Number of `inspect_table_fields` calls so far.
    pub fn field_inspections(&self) -> usize {
        self.field_inspections.load(AtomicOrdering::SeqCst)
    }

    /// Makes writes of `table` rows fail, including relation items.
    pub fn reject_table(&self, table: &str) {
        if let Ok(mut rejected) = self.rejected_tables.lock() {
            rejected.insert(table.to_string());
        }
    }

    /// Makes every following `store` call fail with `StoreError::Rejected`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    /// Snapshot of the rows of `table`.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.lock()
            .map(|tables| tables.get(table).map(|t| t.rows.clone()).unwrap_or_default())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexMap<String, Table>>, Error> {
        self.tables.lock().map_err(|_| Error::LockPoisoned)
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Closed.into());
        }
        Ok(())
    }
}

fn write(tables: &mut IndexMap<String, Table>, rejected: &HashSet<String>, record: &mut Record) -> Result<i64, Error> {
    if rejected.contains(record.table()) {
        return Err(StoreError::Rejected(format!("write to `{}` refused", record.table())).into());
    }

    let table_name = record.table().to_string();
    let table = tables.entry(table_name.clone()).or_insert_with(Table::new);

    for field in record.fields().keys() {
        if !table.columns.contains(field) {
            table.columns.push(field.clone());
        }
    }

    let id = match record.id() {
        Some(id) => id,
        None => {
            let id = table.next_id;
            table.next_id += 1;
            id
        }
    };
    record.set_id(id);

    let mut row = record.clone();
    row.take_lists();
    match table.rows.iter_mut().find(|r| r.id() == Some(id)) {
        Some(existing) => *existing = row,
        None => table.rows.push(row),
    }

    let mut lists = record.take_lists();
    let written = write_relations(tables, rejected, &table_name, id, &mut lists);
    record.restore_lists(lists);
    written?;

    Ok(id)
}

/// Items leave `lists` once written; on error the rest stay pending.
fn write_relations(
    tables: &mut IndexMap<String, Table>,
    rejected: &HashSet<String>,
    table: &str,
    id: i64,
    lists: &mut IndexMap<String, RelationList>,
) -> Result<(), Error> {
    for list in lists.values_mut() {
        while let Some(item) = list.items.first() {
            let mut item = item.clone();
            match list.kind {
                RelationKind::Own => {
                    item.set(parent_column(table), id);
                    write(tables, rejected, &mut item)?;
                }
                RelationKind::Cross => {
                    let item_id = write(tables, rejected, &mut item)?;
                    let mut link = Record::new(link_table(table, item.table()))
                        .with(parent_column(table), id)
                        .with(parent_column(item.table()), item_id);
                    write(tables, rejected, &mut link)?;
                }
            }
            list.items.remove(0);
        }
    }
    Ok(())
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Text(a)), Some(Value::Text(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn store(&self, record: &mut Record) -> Result<i64, Error> {
        self.store_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.ensure_open()?;

        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Rejected(format!("write to `{}` refused", record.table())).into());
        }

        let rejected = self.rejected_tables.lock().map_err(|_| Error::LockPoisoned)?.clone();
        let mut tables = self.lock()?;
        write(&mut tables, &rejected, record)
    }

    async fn inspect_all_tables(&self) -> Result<Vec<String>, Error> {
        self.table_inspections.fetch_add(1, AtomicOrdering::SeqCst);
        self.ensure_open()?;
        Ok(self.lock()?.keys().cloned().collect())
    }

    async fn inspect_table_fields(&self, table: &str) -> Result<Vec<String>, Error> {
        self.field_inspections.fetch_add(1, AtomicOrdering::SeqCst);
        self.ensure_open()?;
        Ok(self.lock()?.get(table).map(|t| t.columns.clone()).unwrap_or_default())
    }

    async fn find_one(&self, table: &str, selector: &Selector) -> Result<Option<Record>, Error> {
        self.find_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.ensure_open()?;

        let tables = self.lock()?;
        let Some(table) = tables.get(table) else {
            return Ok(None);
        };

        let mut hits: Vec<&Record> = table.rows.iter().filter(|row| selector.matches(row)).collect();
        if let Some((column, descending)) = selector.ordering() {
            hits.sort_by(|a, b| {
                let ord = compare(a.get(column), b.get(column));
                if descending { ord.reverse() } else { ord }
            });
        }

        Ok(hits.first().map(|record| (*record).clone()))
    }

    async fn close(&self) -> Result<(), Error> {
        self.closed.store(true, AtomicOrdering::SeqCst);
        Ok(())
    }
}

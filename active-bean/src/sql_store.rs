//! # SQL Store Module
//!
//! A [`Store`] backed by a sqlx `AnyPool`, working across PostgreSQL, MySQL
//! and SQLite. The schema is fluid: `store` creates missing tables and adds
//! missing columns before writing, and `find_one` on a table or column that
//! does not exist yet returns `None` instead of failing.

// ============================================================================
// External Crate Imports
// ============================================================================

use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::{
    any::{AnyArguments, AnyPoolOptions, AnyRow},
    AnyPool, Arguments, Column, Row, ValueRef,
};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    record::{RelationKind, RelationList},
    store::{link_table, parent_column},
    Combinator, Error, Record, Selector, Store, StoreError, Value,
};

// ============================================================================
// Database Driver Enum
// ============================================================================

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drivers {
    /// PostgreSQL driver
    Postgres,
    /// MySQL driver
    MySQL,
    /// SQLite driver
    SQLite,
}

impl Drivers {
    /// Detects the driver from a connection URL scheme.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres") {
            Drivers::Postgres
        } else if url.starts_with("mysql") {
            Drivers::MySQL
        } else {
            Drivers::SQLite
        }
    }

    /// Quotes an identifier for this driver.
    pub fn quote(self, ident: &str) -> String {
        match self {
            Drivers::MySQL => format!("`{}`", ident.replace('`', "``")),
            _ => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// The positional placeholder for the `n`-th (1-based) argument.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Drivers::Postgres => format!("${}", n),
            _ => "?".to_string(),
        }
    }

    fn id_column(self) -> &'static str {
        match self {
            Drivers::Postgres => "\"id\" BIGSERIAL PRIMARY KEY",
            Drivers::MySQL => "`id` BIGINT AUTO_INCREMENT PRIMARY KEY",
            Drivers::SQLite => "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }

    /// The column type created for a value written to a new column.
    fn column_type(self, value: &Value) -> &'static str {
        match (self, value) {
            (Drivers::SQLite, Value::Int(_)) => "INTEGER",
            (_, Value::Int(_)) => "BIGINT",
            (Drivers::SQLite, Value::Float(_)) => "REAL",
            (_, Value::Float(_)) => "DOUBLE PRECISION",
            (_, Value::Bool(_)) => "BOOLEAN",
            (_, Value::Text(_)) | (_, Value::Null) => "TEXT",
        }
    }
}

// ============================================================================
// SqlStore Struct
// ============================================================================

/// A record store over a SQL database.
///
/// Cloning is cheap: the pool is shared.
#[derive(Debug, Clone)]
pub struct SqlStore {
    /// The underlying SQLx connection pool
    pub(crate) pool: AnyPool,
    /// The detected database driver
    pub(crate) driver: Drivers,
}

impl SqlStore {
    /// Connects with the default pool size of 5.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        Self::connect_with(url, 5).await
    }

    /// Connects with at most `max_connections` pooled connections.
    pub async fn connect_with(url: &str, max_connections: u32) -> Result<Self, Error> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new().max_connections(max_connections).connect(url).await?;
        let driver = Drivers::from_url(url);
        log::debug!("connected to {:?} store", driver);
        Ok(Self { pool, driver })
    }

    pub fn driver(&self) -> Drivers {
        self.driver
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Checks if a table exists in the database.
    pub async fn table_exists(&self, table: &str) -> Result<bool, Error> {
        Ok(self.inspect_all_tables().await?.iter().any(|t| t == table))
    }

    /// Returns the current columns of a table.
    async fn table_columns(&self, table: &str) -> Result<Vec<String>, Error> {
        let query = match self.driver {
            Drivers::Postgres => "SELECT column_name::TEXT FROM information_schema.columns WHERE table_name = $1 AND table_schema = 'public' ORDER BY ordinal_position".to_string(),
            Drivers::MySQL => "SELECT column_name FROM information_schema.columns WHERE table_name = ? AND table_schema = DATABASE() ORDER BY ordinal_position".to_string(),
            Drivers::SQLite => format!("PRAGMA table_info({})", self.driver.quote(table)),
        };

        let rows = if let Drivers::SQLite = self.driver {
            sqlx::query(&query).fetch_all(&self.pool).await?
        } else {
            sqlx::query(&query).bind(table.to_string()).fetch_all(&self.pool).await?
        };

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = if let Drivers::SQLite = self.driver { row.try_get("name")? } else { row.try_get(0)? };
            columns.push(name);
        }
        Ok(columns)
    }

    /// Creates the table if needed and adds the columns `record` is missing.
    async fn sync_table(&self, record: &Record) -> Result<(), Error> {
        let table = record.table();
        let quoted = self.driver.quote(table);

        if !self.table_exists(table).await? {
            let query = format!("CREATE TABLE IF NOT EXISTS {} ({})", quoted, self.driver.id_column());
            log::debug!("{}", query);
            sqlx::query(&query).execute(&self.pool).await?;
        }

        let existing = self.table_columns(table).await?;
        for (field, value) in record.fields() {
            if existing.iter().any(|c| c == field) {
                continue;
            }
            let query = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                quoted,
                self.driver.quote(field),
                self.driver.column_type(value)
            );
            log::debug!("{}", query);
            sqlx::query(&query).execute(&self.pool).await?;
        }

        Ok(())
    }

    async fn insert(&self, record: &Record) -> Result<i64, Error> {
        let quoted = self.driver.quote(record.table());
        let mut args = AnyArguments::default();

        let mut query = if record.fields().is_empty() {
            match self.driver {
                Drivers::MySQL => format!("INSERT INTO {} () VALUES ()", quoted),
                _ => format!("INSERT INTO {} DEFAULT VALUES", quoted),
            }
        } else {
            let mut columns = Vec::with_capacity(record.fields().len());
            let mut placeholders = Vec::with_capacity(record.fields().len());
            for (n, (field, value)) in record.fields().iter().enumerate() {
                columns.push(self.driver.quote(field));
                placeholders.push(self.driver.placeholder(n + 1));
                bind(&mut args, value)?;
            }
            format!("INSERT INTO {} ({}) VALUES ({})", quoted, columns.join(", "), placeholders.join(", "))
        };

        if matches!(self.driver, Drivers::Postgres | Drivers::SQLite) {
            query.push_str(" RETURNING \"id\"");
            log::debug!("{}", query);
            let row = sqlx::query_with(&query, args).fetch_one(&self.pool).await?;
            return Ok(row.try_get::<i64, _>(0)?);
        }

        log::debug!("{}", query);
        let result = sqlx::query_with(&query, args).execute(&self.pool).await?;
        result
            .last_insert_id()
            .ok_or_else(|| StoreError::Rejected(format!("no id returned for `{}`", record.table())).into())
    }

    async fn update(&self, record: &Record, id: i64) -> Result<(), Error> {
        if record.fields().is_empty() {
            return Ok(());
        }

        let mut args = AnyArguments::default();
        let mut assignments = Vec::with_capacity(record.fields().len());
        for (n, (field, value)) in record.fields().iter().enumerate() {
            assignments.push(format!("{} = {}", self.driver.quote(field), self.driver.placeholder(n + 1)));
            bind(&mut args, value)?;
        }
        bind(&mut args, &Value::Int(id))?;

        let query = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.driver.quote(record.table()),
            assignments.join(", "),
            self.driver.quote("id"),
            self.driver.placeholder(record.fields().len() + 1)
        );
        log::debug!("{}", query);
        sqlx::query_with(&query, args).execute(&self.pool).await?;
        Ok(())
    }

    /// Writes pending relation items of the record `table`/`id`. Each item
    /// leaves `lists` only once it is stored, so on error `lists` holds the
    /// failed item and everything after it.
    async fn store_relations(
        &self,
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
                        self.store(&mut item).await?;
                    }
                    RelationKind::Cross => {
                        let item_id = self.store(&mut item).await?;
                        let mut link = Record::new(link_table(table, item.table()))
                            .with(parent_column(table), id)
                            .with(parent_column(item.table()), item_id);
                        self.store(&mut link).await?;
                    }
                }
                list.items.remove(0);
            }
        }
        Ok(())
    }

    /// Renders `selector` as a driver-specific `SELECT ... LIMIT 1`.
    pub fn select_sql(&self, table: &str, selector: &Selector) -> String {
        let clauses: Vec<String> = selector
            .columns()
            .iter()
            .enumerate()
            .map(|(n, column)| format!("{} = {}", self.driver.quote(column), self.driver.placeholder(n + 1)))
            .collect();

        let mut query = format!("SELECT * FROM {}", self.driver.quote(table));
        if !clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&clauses.join(selector.combinator().as_sql()));
        }
        if let Some((column, descending)) = selector.ordering() {
            query.push_str(" ORDER BY ");
            query.push_str(&self.driver.quote(column));
            if descending {
                query.push_str(" DESC");
            }
        }
        query.push_str(" LIMIT 1");
        query
    }
}

/// Restricts `selector` to the columns the table has.
///
/// An AND lookup on a missing column cannot match, while an OR lookup only
/// loses that clause. Returns `None` when nothing is left to match on or the
/// order column is missing.
fn narrow(selector: &Selector, columns: &[String]) -> Option<Selector> {
    let known = |column: &str| columns.iter().any(|c| c == column);
    if selector.ordering().is_some_and(|(column, _)| !known(column)) {
        return None;
    }

    let (kept, values): (Vec<String>, Vec<Value>) = selector
        .columns()
        .iter()
        .zip(selector.values())
        .filter(|(column, _)| known(column))
        .map(|(column, value)| (column.clone(), value.clone()))
        .unzip();

    if kept.is_empty() || (kept.len() < selector.columns().len() && selector.combinator() == Combinator::And) {
        return None;
    }

    let mut narrowed = Selector::new(kept, selector.combinator(), values);
    if let Some((column, descending)) = selector.ordering() {
        narrowed = narrowed.order_by(column, descending);
    }
    Some(narrowed)
}

fn bind(args: &mut AnyArguments<'_>, value: &Value) -> Result<(), Error> {
    let added = match value {
        Value::Null => args.add(None::<String>),
        Value::Bool(v) => args.add(*v),
        Value::Int(v) => args.add(*v),
        Value::Float(v) => args.add(*v),
        Value::Text(v) => args.add(v.clone()),
    };
    added.map_err(|e| StoreError::Rejected(e.to_string()).into())
}

fn decode_row(table: &str, row: &AnyRow) -> Result<Record, Error> {
    let mut record = Record::new(table);

    for (index, column) in row.columns().iter().enumerate() {
        let is_null = row.try_get_raw(index)?.is_null();
        let value = if is_null {
            Value::Null
        } else if let Ok(v) = row.try_get::<i64, _>(index) {
            Value::Int(v)
        } else if let Ok(v) = row.try_get::<f64, _>(index) {
            Value::Float(v)
        } else if let Ok(v) = row.try_get::<bool, _>(index) {
            Value::Bool(v)
        } else {
            Value::Text(row.try_get::<String, _>(index)?)
        };

        if column.name() == "id" {
            if let Value::Int(id) = value {
                record.set_id(id);
                continue;
            }
        }
        record.set(column.name(), value);
    }

    Ok(record)
}

// ============================================================================
// Store Implementation
// ============================================================================

#[async_trait]
impl Store for SqlStore {
    async fn store(&self, record: &mut Record) -> Result<i64, Error> {
        self.sync_table(record).await?;

        let id = match record.id() {
            Some(id) => {
                self.update(record, id).await?;
                id
            }
            None => self.insert(record).await?,
        };
        record.set_id(id);

        let table = record.table().to_string();
        let mut lists = record.take_lists();
        let written = self.store_relations(&table, id, &mut lists).await;
        record.restore_lists(lists);
        written?;

        Ok(id)
    }

    async fn inspect_all_tables(&self) -> Result<Vec<String>, Error> {
        let query = match self.driver {
            Drivers::Postgres => "SELECT table_name::TEXT FROM information_schema.tables WHERE table_schema = 'public'",
            Drivers::MySQL => "SELECT table_name FROM information_schema.tables WHERE table_schema = DATABASE()",
            Drivers::SQLite => "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        };

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            tables.push(row.try_get::<String, _>(0)?);
        }
        Ok(tables)
    }

    async fn inspect_table_fields(&self, table: &str) -> Result<Vec<String>, Error> {
        if !self.table_exists(table).await? {
            return Ok(Vec::new());
        }
        self.table_columns(table).await
    }

    async fn find_one(&self, table: &str, selector: &Selector) -> Result<Option<Record>, Error> {
        if !self.table_exists(table).await? {
            return Ok(None);
        }

        let columns = self.table_columns(table).await?;
        let Some(selector) = narrow(selector, &columns) else {
            return Ok(None);
        };

        let query = self.select_sql(table, &selector);
        let mut args = AnyArguments::default();
        for value in selector.values() {
            bind(&mut args, value)?;
        }

        log::debug!("{} {:?}", query, selector.values());
        let row = sqlx::query_with(&query, args).fetch_optional(&self.pool).await?;
        row.map(|row| decode_row(table, &row)).transpose()
    }

    async fn close(&self) -> Result<(), Error> {
        self.pool.close().await;
        Ok(())
    }
}

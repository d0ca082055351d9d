//! # Active Record Module
//!
//! [`ActiveRecord`] wraps an [`Entity`] together with the record it is bound
//! to and drives the lifecycle:
//!
//! ```text
//! Unbound --load_by/upsert_by--> Bound --prepare--> Prepared --save--> Persisted
//!                                  ^                                       |
//!                                  +------------ load_by/upsert_by --------+
//! ```
//!
//! Every operation is reachable both through a typed method (`load_by`,
//! `upsert_by`, `get`, `set`, `list`, `xlist`) and through [`ActiveRecord::call`],
//! which resolves a convention name such as `upsertByIntValue_and_StringValue`.

use crate::{
    cache::CacheEntry,
    expression::FieldExpression,
    materializer::{materialize, serialize_into, FieldMap},
    naming::{decamelize, property_name, relation_suffix},
    operation::{Operation, Verb},
    record::RelationKind,
    selector, Database, Entity, Error, Record, Selector, Value,
};

// ============================================================================
// Lifecycle, Arguments and Outcomes
// ============================================================================

/// Where an [`ActiveRecord`] is in its load/prepare/save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No record is bound.
    Unbound,
    /// A record was loaded or dispensed and the field map is populated.
    Bound,
    /// The entity's properties have been copied into the record.
    Prepared,
    /// The store acknowledged the last write.
    Persisted,
}

/// An argument passed to [`ActiveRecord::call`].
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Value(Value),
    Record(Record),
}

impl From<Record> for Argument {
    fn from(record: Record) -> Self {
        Argument::Record(record)
    }
}

macro_rules! impl_argument_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Argument {
                fn from(value: $t) -> Self {
                    Argument::Value(value.into())
                }
            }
        )*
    };
}

impl_argument_from!(Value, bool, i32, i64, f64, &str, String);

/// What [`ActiveRecord::call`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The operation mutated the active record; keep chaining on it.
    Fluent,
    /// The result of a `get` operation.
    Value(Option<Value>),
}

impl Outcome {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(value) => value,
            Outcome::Fluent => None,
        }
    }
}

// ============================================================================
// ActiveRecord Struct
// ============================================================================

/// An entity bound to a [`Database`].
///
/// Methods take `&mut self`, so one active record can never be mutated from
/// two places at once.
#[derive(Debug)]
pub struct ActiveRecord<E> {
    db: Database,
    entity: E,
    record: Option<Record>,
    is_new: bool,
    fields: FieldMap,
    lookup: Option<(String, Selector)>,
    state: Lifecycle,
}

impl<E: Entity> ActiveRecord<E> {
    pub fn new(db: Database, entity: E) -> Self {
        Self {
            db,
            entity,
            record: None,
            is_new: false,
            fields: FieldMap::new(),
            lookup: None,
            state: Lifecycle::Unbound,
        }
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// Mutable access to the entity. A prepared record will be prepared
    /// again on the next `save()`.
    pub fn entity_mut(&mut self) -> &mut E {
        if self.state == Lifecycle::Prepared {
            self.state = Lifecycle::Bound;
        }
        &mut self.entity
    }

    pub fn into_inner(self) -> E {
        self.entity
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// `true` when the bound record was dispensed rather than found, until
    /// it is saved.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// The field map of the bound record.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    fn selector(&self, token: &str, args: &[Value]) -> Result<Selector, Error> {
        let expr = FieldExpression::parse(&decamelize(token))?;
        selector::build(&expr, &self.entity, args)
    }

    async fn bind(&mut self, record: Record, key: String, selector: Selector) -> Result<(), Error> {
        let schema = self.db.fields(E::table_name()).await?;
        self.fields = materialize(&record, &schema);
        self.is_new = record.is_new();
        self.record = Some(record);
        self.lookup = Some((key, selector));
        self.state = Lifecycle::Bound;
        Ok(())
    }

    /// Loads the record matching `token`, e.g. `IntValue_and_StringValue`.
    ///
    /// Values are read from the entity's properties; `args[i]`, when given,
    /// replaces the value of the i-th field. Fails with `NotFound` when no
    /// row matches, leaving any previous binding untouched.
    pub async fn load_by(&mut self, token: &str, args: &[Value]) -> Result<&mut Self, Error> {
        let selector = self.selector(token, args)?;
        let table = E::table_name();

        let (key, found) = self.db.find(table, &selector).await?;
        let record = found.ok_or_else(|| Error::NotFound { table: table.to_string(), predicate: selector.predicate() })?;

        self.bind(record, key, selector).await?;
        Ok(self)
    }

    /// Loads the record matching `token`, or dispenses a new one.
    ///
    /// Either way the leading field is set to the first bound value.
    pub async fn upsert_by(&mut self, token: &str, args: &[Value]) -> Result<&mut Self, Error> {
        let selector = self.selector(token, args)?;
        let table = E::table_name();

        let (key, found) = self.db.find(table, &selector).await?;
        let mut record = match found {
            Some(record) => record,
            None => {
                log::debug!("dispensing new `{}` record", table);
                self.db.store().dispense(table)
            }
        };

        if let (Some(column), Some(value)) = (selector.columns().first(), selector.values().first()) {
            record.set(column.clone(), value.clone());
        }

        self.bind(record, key, selector).await?;
        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Field Access
    // ------------------------------------------------------------------------

    /// Reads a field of the bound record. Any spelling works: `StringValue`,
    /// `stringValue`, `string_value`. A field stored under a name that is
    /// not lowerCamel, such as a renamed property, is found as written.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).or_else(|| self.fields.get(&property_name(field)))
    }

    /// Writes a field of the bound record directly.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self, Error> {
        let record = self.record.as_mut().ok_or(Error::Unbound("set"))?;
        let property = if E::has_property(field) || self.fields.contains_key(field) {
            field.to_string()
        } else {
            property_name(field)
        };
        let value = value.into();

        record.set(property.clone(), value.clone());
        self.fields.insert(property, value);
        Ok(self)
    }

    /// Appends `item` to the owned list `own<Relation>List`.
    pub fn list(&mut self, relation: &str, item: Record) -> Result<&mut Self, Error> {
        self.append(RelationKind::Own, relation, item, "list")
    }

    /// Appends `item` to the cross list `xown<Relation>List`.
    pub fn xlist(&mut self, relation: &str, item: Record) -> Result<&mut Self, Error> {
        self.append(RelationKind::Cross, relation, item, "xlist")
    }

    fn append(&mut self, kind: RelationKind, relation: &str, item: Record, verb: &'static str) -> Result<&mut Self, Error> {
        let record = self.record.as_mut().ok_or(Error::Unbound(verb))?;
        record.append(kind, &relation_suffix(relation), item);
        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Copies the entity's properties into the bound record.
    ///
    /// Does nothing while unbound. Calling it twice simply copies the current
    /// values again.
    pub fn prepare(&mut self) -> Result<&mut Self, Error> {
        if let Some(record) = self.record.as_mut() {
            serialize_into(&self.entity, record)?;
            for (field, value) in record.fields() {
                self.fields.insert(field.clone(), value.clone());
            }
            self.state = Lifecycle::Prepared;
        }
        Ok(self)
    }

    /// Prepares the record if needed and writes it to the store.
    ///
    /// Returns the record id. On success the lookup that bound this record
    /// is refreshed in the cache, or evicted if the record no longer matches
    /// it.
    pub async fn save(&mut self) -> Result<i64, Error> {
        if self.record.is_none() {
            return Err(Error::Unbound("save"));
        }
        if self.state != Lifecycle::Prepared {
            self.prepare()?;
        }

        let Some(record) = self.record.as_mut() else {
            return Err(Error::Unbound("save"));
        };

        let id = match self.db.store().store(record).await {
            Ok(id) => id,
            Err(err) => {
                log::warn!("failed to store `{}` record: {}", record.table(), err);
                return Err(err);
            }
        };
        log::debug!("stored `{}` record {}", record.table(), id);

        if let Some((key, selector)) = &self.lookup {
            if selector.matches(record) {
                self.db.cache().set(key, CacheEntry::Found(record.clone()))?;
            } else {
                self.db.cache().remove(key)?;
            }
        }

        self.fields.insert("id".to_string(), Value::Int(id));
        self.is_new = false;
        self.state = Lifecycle::Persisted;
        Ok(id)
    }

    // ------------------------------------------------------------------------
    // Convention Dispatch
    // ------------------------------------------------------------------------

    /// Resolves a convention-named operation and runs it.
    ///
    /// ```rust,ignore
    /// active.call("upsertByIntValue_and_StringValue", vec![]).await?;
    /// active.call("setNote", vec!["hello".into()]).await?;
    /// let note = active.call("getNote", vec![]).await?.into_value();
    /// active.call("listBook", vec![Record::new("book").into()]).await?;
    /// ```
    pub async fn call(&mut self, name: &str, args: Vec<Argument>) -> Result<Outcome, Error> {
        let op = Operation::parse(name)?;

        match op.verb {
            Verb::LoadBy => {
                let values = values(name, args)?;
                self.load_by(&op.field, &values).await?;
                Ok(Outcome::Fluent)
            }
            Verb::UpsertBy => {
                let values = values(name, args)?;
                self.upsert_by(&op.field, &values).await?;
                Ok(Outcome::Fluent)
            }
            Verb::Get => Ok(Outcome::Value(self.get(&op.field).cloned())),
            Verb::Set => match args.into_iter().next() {
                Some(Argument::Value(value)) => {
                    self.set(&op.field, value)?;
                    Ok(Outcome::Fluent)
                }
                _ => Err(Error::InvalidArgument { operation: name.to_string(), expected: "a value" }),
            },
            Verb::List | Verb::XList => match args.into_iter().next() {
                Some(Argument::Record(item)) => {
                    match op.verb {
                        Verb::List => self.list(&op.suffix, item)?,
                        _ => self.xlist(&op.suffix, item)?,
                    };
                    Ok(Outcome::Fluent)
                }
                _ => Err(Error::InvalidArgument { operation: name.to_string(), expected: "a record" }),
            },
        }
    }
}

fn values(name: &str, args: Vec<Argument>) -> Result<Vec<Value>, Error> {
    args.into_iter()
        .map(|arg| match arg {
            Argument::Value(value) => Ok(value),
            Argument::Record(_) => Err(Error::InvalidArgument { operation: name.to_string(), expected: "values" }),
        })
        .collect()
}

//! # Selector Module
//!
//! Binds a [`FieldExpression`] to an entity's current property values,
//! producing a positional equality predicate such as
//! `intValue = ? AND stringValue = ?` with the matching value list.

use crate::{
    expression::{Combinator, FieldExpression},
    naming::camelize,
    Entity, Error, Value,
};

// ============================================================================
// Selector Struct
// ============================================================================

/// A resolved single-row lookup: equality clauses, combinator, optional
/// ordering and the bound values.
///
/// `columns()[i]` is always bound to `values()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    columns: Vec<String>,
    combinator: Combinator,
    order_by: Option<(String, bool)>,
    values: Vec<Value>,
}

impl Selector {
    pub fn new(columns: Vec<String>, combinator: Combinator, values: Vec<Value>) -> Self {
        Self { columns, combinator, order_by: None, values }
    }

    /// Orders the lookup by a column, descending when `descending` is set.
    pub fn order_by(mut self, column: impl Into<String>, descending: bool) -> Self {
        self.order_by = Some((column.into(), descending));
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn ordering(&self) -> Option<(&str, bool)> {
        self.order_by.as_ref().map(|(column, desc)| (column.as_str(), *desc))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The canonical predicate: `a = ? AND b = ?[ ORDER BY c[ DESC]]`.
    pub fn predicate(&self) -> String {
        let mut predicate = self
            .columns
            .iter()
            .map(|column| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(self.combinator.as_sql());

        if let Some((column, descending)) = &self.order_by {
            predicate.push_str(" ORDER BY ");
            predicate.push_str(column);
            if *descending {
                predicate.push_str(" DESC");
            }
        }

        predicate
    }

    /// Tests the predicate against a record's fields.
    ///
    /// A missing field never matches. `id` compares against the record id.
    pub fn matches(&self, record: &crate::Record) -> bool {
        let mut checks = self.columns.iter().zip(&self.values).map(|(column, value)| match column.as_str() {
            "id" => record.id().map(Value::Int).as_ref() == Some(value),
            _ => record.get(column) == Some(value),
        });

        match self.combinator {
            Combinator::And => checks.all(|hit| hit),
            Combinator::Or => checks.any(|hit| hit),
        }
    }
}

// ============================================================================
// Selector Builder
// ============================================================================

/// Builds the selector for `expr` against `entity`.
///
/// Values come from the entity's properties (`int_value` reads `intValue`),
/// except that `overrides[i]`, when present, replaces the value of the i-th
/// field.
pub fn build<E: Entity>(expr: &FieldExpression, entity: &E, overrides: &[Value]) -> Result<Selector, Error> {
    let mut columns = Vec::with_capacity(expr.fields().len());
    let mut values = Vec::with_capacity(expr.fields().len());

    for (position, field) in expr.fields().iter().enumerate() {
        let property = column::<E>(field);
        let value = match overrides.get(position) {
            Some(value) => value.clone(),
            None => read_property(entity, &property)?,
        };

        columns.push(property);
        values.push(value);
    }

    let mut selector = Selector::new(columns, expr.combinator(), values);
    if let Some(order) = expr.order_by() {
        selector = selector.order_by(column::<E>(&order.field), order.descending);
    }

    Ok(selector)
}

/// The property a field token names: a declared property as written (which
/// covers renamed ones), otherwise the lowerCamel form of the token.
pub(crate) fn column<E: Entity>(field: &str) -> String {
    if E::has_property(field) { field.to_string() } else { camelize(field) }
}

pub(crate) fn read_property<E: Entity>(entity: &E, property: &str) -> Result<Value, Error> {
    match entity.property_value(property) {
        Some(Ok(value)) => Ok(value),
        Some(Err(source)) => Err(Error::Serialization { property: property.to_string(), source }),
        None => Err(Error::UnknownProperty { entity: E::entity_name(), property: property.to_string() }),
    }
}

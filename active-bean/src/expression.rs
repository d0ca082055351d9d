//! # Field Expression Module
//!
//! Parses the field part of an operation name (already decamelized) into a
//! [`FieldExpression`]:
//!
//! * `email` -> `Literal("email")`
//! * `int_value_and_string_value` -> `And(["int_value", "string_value"])`
//! * `name_or_nickname` -> `Or(["name", "nickname"])`
//! * `status_order_by_created_at` -> `Ordered(Literal("status"), created_at)`
//!
//! A token using both `_and_` and `_or_` is rejected; there is no precedence
//! between the two separators.

use crate::Error;

const ORDER_BY: &str = "_order_by_";
const AND: &str = "_and_";
const OR: &str = "_or_";

/// The logical join applied between predicate clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    /// The SQL keyword, padded with spaces.
    pub fn as_sql(self) -> &'static str {
        match self {
            Combinator::And => " AND ",
            Combinator::Or => " OR ",
        }
    }
}

/// The ordering clause of an expression, e.g. `created_at_desc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// A parsed field expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldExpression {
    Literal(String),
    And(Vec<String>),
    Or(Vec<String>),
    Ordered(Box<FieldExpression>, OrderBy),
}

impl FieldExpression {
    /// Parses a decamelized field token.
    pub fn parse(token: &str) -> Result<Self, Error> {
        if let Some((head, clause)) = token.split_once(ORDER_BY) {
            let inner = Self::parse_fields(token, head)?;
            let order = parse_order(token, clause)?;
            return Ok(FieldExpression::Ordered(Box::new(inner), order));
        }

        Self::parse_fields(token, token)
    }

    fn parse_fields(token: &str, fields: &str) -> Result<Self, Error> {
        let has_and = fields.contains(AND);
        let has_or = fields.contains(OR);

        match (has_and, has_or) {
            (true, true) => Err(Error::MixedCombinatorExpression(token.to_string())),
            (true, false) => split(token, fields, AND).map(FieldExpression::And),
            (false, true) => split(token, fields, OR).map(FieldExpression::Or),
            (false, false) => {
                if fields.is_empty() {
                    return Err(Error::InvalidExpression(token.to_string()));
                }
                Ok(FieldExpression::Literal(fields.to_string()))
            }
        }
    }

    /// The participating field names in order.
    pub fn fields(&self) -> &[String] {
        match self {
            FieldExpression::Literal(field) => std::slice::from_ref(field),
            FieldExpression::And(fields) | FieldExpression::Or(fields) => fields,
            FieldExpression::Ordered(inner, _) => inner.fields(),
        }
    }

    /// The combinator; a single field reports `And`.
    pub fn combinator(&self) -> Combinator {
        match self {
            FieldExpression::Literal(_) | FieldExpression::And(_) => Combinator::And,
            FieldExpression::Or(_) => Combinator::Or,
            FieldExpression::Ordered(inner, _) => inner.combinator(),
        }
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        match self {
            FieldExpression::Ordered(_, order) => Some(order),
            _ => None,
        }
    }
}

fn split(token: &str, fields: &str, separator: &str) -> Result<Vec<String>, Error> {
    let parts: Vec<String> = fields.split(separator).map(str::to_string).collect();
    if parts.iter().any(String::is_empty) {
        return Err(Error::InvalidExpression(token.to_string()));
    }
    Ok(parts)
}

fn parse_order(token: &str, clause: &str) -> Result<OrderBy, Error> {
    let (field, descending) = if let Some(field) = clause.strip_suffix("_desc") {
        (field, true)
    } else if let Some(field) = clause.strip_suffix("_asc") {
        (field, false)
    } else {
        (clause, false)
    };

    if field.is_empty() || field.contains(AND) || field.contains(OR) {
        return Err(Error::InvalidExpression(token.to_string()));
    }

    Ok(OrderBy { field: field.to_string(), descending })
}

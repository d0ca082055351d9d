//! # Value Module
//!
//! The scalar values exchanged with a record store, and the [`ToValue`]
//! conversion used to copy entity properties into records. Scalars pass
//! through unchanged; composite values (sequences, maps, [`Json`] wrapped
//! structures) are encoded as JSON text.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

// ============================================================================
// Value Enum
// ============================================================================

/// A single field value of a [`Record`](crate::Record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ============================================================================
// ToValue Trait
// ============================================================================

/// Converts an entity property into a store [`Value`].
///
/// Implemented for the primitive scalars, `Option`, the std collections,
/// `serde_json::Value`, [`Json`], `Uuid` and the chrono date types. The
/// `#[derive(Entity)]` macro calls it for every mapped field.
pub trait ToValue {
    fn to_value(&self) -> Result<Value, serde_json::Error>;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        (**self).to_value()
    }
}

macro_rules! impl_to_value_int {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Result<Value, serde_json::Error> {
                    Ok(Value::Int(i64::from(*self)))
                }
            }
        )*
    };
}

impl_to_value_int!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for bool {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Bool(*self))
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Float(f64::from(*self)))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Float(*self))
    }
}

impl ToValue for str {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Text(self.to_string()))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Text(self.clone()))
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(self.clone())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Some(inner) => inner.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl ToValue for uuid::Uuid {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Text(self.to_string()))
    }
}

impl ToValue for chrono::DateTime<chrono::Utc> {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Text(self.to_rfc3339()))
    }
}

impl ToValue for chrono::NaiveDateTime {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Text(self.to_string()))
    }
}

impl ToValue for chrono::NaiveDate {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Text(self.to_string()))
    }
}

// ============================================================================
// Composite Values
// ============================================================================

/// Wraps a nested structure so it is stored as JSON text.
///
/// ```rust,ignore
/// #[derive(Entity)]
/// struct Order {
///     reference: String,
///     address: Json<Address>,
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Json<T>(pub T);

impl<T: Serialize> ToValue for Json<T> {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        encode(&self.0)
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        encode(self)
    }
}

impl<T: Serialize> ToValue for Vec<T> {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        encode(self)
    }
}

impl<T: Serialize + Eq + Hash> ToValue for HashSet<T> {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        encode(self)
    }
}

impl<K: Serialize + Eq + Hash, V: Serialize> ToValue for HashMap<K, V> {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        encode(self)
    }
}

impl<K: Serialize + Ord, V: Serialize> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        encode(self)
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_string(value).map(Value::Text)
}

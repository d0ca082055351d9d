use crate::Value;

/// Metadata about one mapped property of an entity.
///
/// Populated by the `#[derive(Entity)]` macro, one entry per struct field
/// that is not marked `#[bean(skip)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    /// The property (and column) name, lowerCamel case, e.g. `intValue`.
    pub name: &'static str,
    /// The Rust field identifier, e.g. `int_value`.
    pub field: &'static str,
}

/// A typed value that can act as an active record.
///
/// This trait replaces runtime reflection: the declared property list and
/// the per-property accessors are generated at compile time.
///
/// # Example
///
/// ```rust,ignore
/// use active_bean::Entity;
///
/// #[derive(Entity)]
/// struct Test {
///     int_value: i32,
///     string_value: String,
///     #[bean(skip)]
///     scratch: Vec<u8>,
/// }
///
/// assert_eq!(Test::table_name(), "test");
/// ```
pub trait Entity {
    /// The type name as written in Rust, e.g. `Test`.
    fn entity_name() -> &'static str;

    /// The store table: the type name lower-cased.
    fn table_name() -> &'static str;

    /// The mapped properties in declaration order.
    fn properties() -> Vec<PropertyInfo>;

    /// Reads one property by its lowerCamel name.
    ///
    /// Returns `None` for an undeclared property and `Some(Err(_))` when a
    /// composite value cannot be encoded.
    fn property_value(&self, property: &str) -> Option<Result<Value, serde_json::Error>>;

    /// Returns `true` if `property` is one of the mapped properties.
    fn has_property(property: &str) -> bool {
        Self::properties().iter().any(|p| p.name == property)
    }
}

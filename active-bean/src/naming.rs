//! Conversions between operation-name tokens and property names.
//!
//! Field expressions are parsed in snake case (`int_value_and_string_value`),
//! while properties and store columns use lowerCamel case (`intValue`).

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

/// Converts a camel-case token to snake case: `IntValue_and_StringValue` ->
/// `int_value_and_string_value`.
pub fn decamelize(token: &str) -> String {
    token.to_snake_case()
}

/// Converts a snake-case field name to its property name: `created_at` ->
/// `createdAt`.
pub fn camelize(field: &str) -> String {
    field.to_lower_camel_case()
}

/// Normalizes any spelling of a property (`IntValue`, `intValue`,
/// `int_value`) to its lowerCamel form.
pub fn property_name(name: &str) -> String {
    camelize(&decamelize(name))
}

/// Normalizes a relation name to the suffix of its list key: `book_tag` ->
/// `BookTag` (as in `ownBookTagList`).
pub fn relation_suffix(name: &str) -> String {
    name.to_upper_camel_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decamelize_keeps_explicit_separators() {
        assert_eq!(decamelize("IntValue_and_StringValue"), "int_value_and_string_value");
        assert_eq!(decamelize("Status_order_by_CreatedAt"), "status_order_by_created_at");
        assert_eq!(decamelize("Email"), "email");
    }

    #[test]
    fn camelize_inverts_decamelize() {
        for name in ["intValue", "stringValue", "random2", "createdAt", "id"] {
            assert_eq!(camelize(&decamelize(name)), name);
        }
    }

    #[test]
    fn property_name_accepts_any_spelling() {
        assert_eq!(property_name("IntValue"), "intValue");
        assert_eq!(property_name("intValue"), "intValue");
        assert_eq!(property_name("int_value"), "intValue");
    }

    #[test]
    fn relation_suffix_is_upper_camel() {
        assert_eq!(relation_suffix("book"), "Book");
        assert_eq!(relation_suffix("BookTag"), "BookTag");
    }
}

//! # Operation Module
//!
//! Resolves a convention-named operation such as
//! `upsertByIntValue_and_StringValue` into a [`Verb`] and its field token.
//! Verbs are declared once in [`REGISTRY`]; the longest registered prefix
//! wins.

use crate::{naming::decamelize, Error};

/// The operation verbs understood by [`ActiveRecord`](crate::ActiveRecord).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    LoadBy,
    UpsertBy,
    Get,
    Set,
    List,
    XList,
}

/// Verb tokens in declaration order.
pub const REGISTRY: [(&str, Verb); 6] = [
    ("loadBy", Verb::LoadBy),
    ("upsertBy", Verb::UpsertBy),
    ("get", Verb::Get),
    ("set", Verb::Set),
    ("list", Verb::List),
    ("xlist", Verb::XList),
];

impl Verb {
    pub fn token(self) -> &'static str {
        REGISTRY
            .iter()
            .find(|(_, verb)| *verb == self)
            .map(|(token, _)| *token)
            .unwrap_or_default()
    }
}

/// A resolved operation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub verb: Verb,
    /// The name with the verb removed, as written: `IntValue_and_StringValue`.
    pub suffix: String,
    /// The decamelized suffix: `int_value_and_string_value`.
    pub field: String,
}

impl Operation {
    /// Resolves `name` against the registry.
    pub fn parse(name: &str) -> Result<Self, Error> {
        let (token, verb) = REGISTRY
            .iter()
            .filter(|(token, _)| name.starts_with(token))
            .max_by_key(|(token, _)| token.len())
            .ok_or_else(|| Error::UnrecognizedOperation(name.to_string()))?;

        let suffix = &name[token.len()..];
        Ok(Self { verb: *verb, suffix: suffix.to_string(), field: decamelize(suffix) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_verb() {
        let cases = [
            ("loadByEmail", Verb::LoadBy, "email"),
            ("upsertByIntValue_and_StringValue", Verb::UpsertBy, "int_value_and_string_value"),
            ("getStringValue", Verb::Get, "string_value"),
            ("setStringValue", Verb::Set, "string_value"),
            ("listBook", Verb::List, "book"),
            ("xlistTag", Verb::XList, "tag"),
        ];

        for (name, verb, field) in cases {
            let op = Operation::parse(name).unwrap();
            assert_eq!(op.verb, verb, "{name}");
            assert_eq!(op.field, field, "{name}");
        }
    }

    #[test]
    fn keeps_the_raw_suffix_for_relations() {
        let op = Operation::parse("xlistBookTag").unwrap();
        assert_eq!(op.suffix, "BookTag");
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        let err = Operation::parse("deleteByEmail").unwrap_err();
        assert!(matches!(err, Error::UnrecognizedOperation(name) if name == "deleteByEmail"));
    }

    #[test]
    fn verb_tokens_round_trip() {
        for (token, verb) in REGISTRY {
            assert_eq!(verb.token(), token);
        }
    }
}

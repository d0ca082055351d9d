//! # Active Bean Macros
//!
//! Procedural macros for Active Bean:
//!
//! * `#[derive(Entity)]` declares a struct's table and mapped properties.
//! * `#[derive(BeanEnum)]` stores a unit-only enum by variant name.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod derive_entity;
mod derive_enum;

/// Implements `active_bean::Entity` for a struct with named fields.
///
/// Field attributes:
///
/// * `#[bean(skip)]` keeps the field out of the mapping.
/// * `#[bean(rename = "column")]` overrides the property name, which
///   otherwise is the lowerCamel form of the field name.
#[proc_macro_derive(Entity, attributes(bean))]
pub fn entity_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_entity::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}

/// Implements `Display`, `FromStr` and `active_bean::ToValue` for an enum.
#[proc_macro_derive(BeanEnum)]
pub fn bean_enum_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_enum::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}

//! # Enum Derive Macro Implementation
//!
//! This module implements the procedural macro expansion for
//! `#[derive(BeanEnum)]`. Variants are stored as their names, so the enum
//! gets `Display`, `FromStr` and `active_bean::ToValue` implementations.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

/// Expands the `#[derive(BeanEnum)]` macro.
pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let name = &ast.ident;

    // Ensure input is a unit-only enum
    let variants = match &ast.data {
        Data::Enum(data_enum) => &data_enum.variants,
        _ => return Err(syn::Error::new_spanned(name, "BeanEnum can only be derived for enums")),
    };
    if let Some(variant) = variants.iter().find(|v| !matches!(v.fields, Fields::Unit)) {
        return Err(syn::Error::new_spanned(variant, "BeanEnum variants cannot carry data"));
    }

    // Generate Display arms: Self::Variant => "Variant"
    let display_arms = variants.iter().map(|variant| {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();
        quote! {
            Self::#variant_ident => write!(f, #variant_name),
        }
    });

    // Generate FromStr arms: "Variant" => Ok(Self::Variant)
    let from_str_arms = variants.iter().map(|variant| {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();
        quote! {
            #variant_name => Ok(Self::#variant_ident),
        }
    });

    Ok(quote! {
        impl std::fmt::Display for #name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    #(#display_arms)*
                }
            }
        }

        impl std::str::FromStr for #name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    #(#from_str_arms)*
                    _ => Err(format!("Unknown variant: {}", s)),
                }
            }
        }

        impl active_bean::ToValue for #name {
            fn to_value(&self) -> Result<active_bean::Value, active_bean::serde_json::Error> {
                Ok(active_bean::Value::Text(self.to_string()))
            }
        }
    })
}

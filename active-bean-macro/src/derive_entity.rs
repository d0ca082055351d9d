use heck::ToLowerCamelCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{ext::IdentExt, Data, DeriveInput, Fields};

/// A struct field that takes part in the mapping.
struct Property {
    ident: syn::Ident,
    name: String,
}

/// Expands the `#[derive(Entity)]` macro.
///
/// This function parses the struct fields and `#[bean(...)]` attributes to
/// generate the `impl Entity` block: table name, property list and the
/// per-property accessor.
pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;

    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new_spanned(struct_name, "Entity must have named fields")),
        },
        _ => return Err(syn::Error::new_spanned(struct_name, "Entity must be a struct")),
    };

    let mut properties = Vec::with_capacity(fields.len());

    for f in fields {
        let Some(ident) = f.ident.clone() else {
            continue;
        };

        let mut skip = false;
        let mut rename = None;

        // Parse attributes #[bean(...)]
        for attr in &f.attrs {
            if !attr.path().is_ident("bean") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                    return Ok(());
                }

                if meta.path.is_ident("rename") {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    rename = Some(value.value());
                    return Ok(());
                }

                Err(meta.error("unsupported bean attribute, expected `skip` or `rename = \"...\"`"))
            })?;
        }

        if skip {
            continue;
        }

        let name = rename.unwrap_or_else(|| ident.unraw().to_string().to_lower_camel_case());
        properties.push(Property { ident, name });
    }

    let entity_name = struct_name.unraw().to_string();
    let table_name = entity_name.to_lowercase();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let property_infos = properties.iter().map(|p| {
        let name = &p.name;
        let field = p.ident.unraw().to_string();
        quote! {
            active_bean::PropertyInfo { name: #name, field: #field }
        }
    });

    let value_arms = properties.iter().map(|p| {
        let name = &p.name;
        let ident = &p.ident;
        quote! {
            #name => Some(active_bean::ToValue::to_value(&self.#ident)),
        }
    });

    Ok(quote! {
        impl #impl_generics active_bean::Entity for #struct_name #ty_generics #where_clause {
            fn entity_name() -> &'static str {
                #entity_name
            }

            fn table_name() -> &'static str {
                #table_name
            }

            fn properties() -> Vec<active_bean::PropertyInfo> {
                vec![#(#property_infos),*]
            }

            fn property_value(
                &self,
                property: &str,
            ) -> Option<Result<active_bean::Value, active_bean::serde_json::Error>> {
                match property {
                    #(#value_arms)*
                    _ => None,
                }
            }
        }
    })
}

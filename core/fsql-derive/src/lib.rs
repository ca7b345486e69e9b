//! fsql Derive: procedural macros for fsql.
//!
//! Provides `#[derive(FromRow)]` for reading a struct out of the current
//! cursor row.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, parse_macro_input};

/// Derive macro reading every field by column label.
///
/// # Example
///
/// ```ignore
/// #[derive(FromRow)]
/// pub struct User {
///     pub id: i64,
///     #[fsql(rename = "user_name")]
///     pub name: String,
///     pub email: Option<String>,
/// }
/// ```
///
/// Labels are matched case-insensitively; `Option<T>` fields accept NULL.
#[proc_macro_derive(FromRow, attributes(fsql))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(
                    name,
                    "FromRow can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "FromRow can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let mut reads = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let label = match column_label(field) {
            Ok(label) => label.unwrap_or_else(|| ident.to_string()),
            Err(e) => return e.to_compile_error().into(),
        };
        let ty = &field.ty;
        reads.push(quote! {
            #ident: ::fsql_core::driver::RowExt::get_by_label::<#ty>(row, #label)?
        });
    }

    let expanded = quote! {
        impl #impl_generics ::fsql_core::api::FromRow for #name #ty_generics #where_clause {
            fn from_row<C: ::fsql_core::driver::RowCursor + ?Sized>(
                row: &C,
            ) -> ::fsql_core::error::FsqlResult<Self> {
                Ok(Self {
                    #(#reads),*
                })
            }
        }
    };

    TokenStream::from(expanded)
}

fn column_label(field: &Field) -> syn::Result<Option<String>> {
    for attr in &field.attrs {
        if !attr.path().is_ident("fsql") {
            continue;
        }
        let mut label = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                label = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported fsql attribute"))
            }
        })?;
        if label.is_some() {
            return Ok(label);
        }
    }
    Ok(None)
}

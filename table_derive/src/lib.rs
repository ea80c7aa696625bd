//! Procedural macros for mapping record structs onto tables
//!
//! This crate provides the `TableMetadata` derive and the `#[model]`
//! convenience attribute used by repository records.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod codegen;
mod model_macro;
mod parsing;

use codegen::generate_table_metadata_impl;
use model_macro::model_attribute;
use parsing::{parse_field_attributes, parse_table_attributes};

/// Derive macro for TableMetadata trait
///
/// Every named field becomes a column, in declaration order. Exactly one
/// field must carry `#[primary_key]`, and its type becomes the record's `Id`.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, sqlx::FromRow, TableMetadata)]
/// #[table(name = "books")]
/// pub struct Book {
///     #[primary_key]
///     pub id: String,
///     pub title: String,
///     pub pages: i32,
/// }
/// ```
#[proc_macro_derive(TableMetadata, attributes(table, primary_key))]
pub fn derive_table_metadata(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let table_info = match parse_table_attributes(&input) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    let field_info = match parse_field_attributes(&input) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    generate_table_metadata_impl(&input.ident, &table_info, &field_info).into()
}

/// Convenience attribute macro that adds all necessary derives for a record
///
/// ```rust,ignore
/// #[model]
/// #[table(name = "books")]
/// pub struct Book {
///     #[primary_key]
///     pub id: String,
///     pub title: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    model_attribute(attr, item)
}

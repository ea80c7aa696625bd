//! Code generation for the `TableMetadata` implementation
//!
//! Emits the table and column names as static data plus the binding
//! functions that push each field onto a query in column order.

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

use crate::parsing::{FieldInfo, TableInfo};

pub fn generate_table_metadata_impl(
    name: &Ident,
    table_info: &TableInfo,
    field_info: &FieldInfo,
) -> TokenStream {
    let table_name = &table_info.name;
    let column_names: Vec<&str> = field_info.columns.iter().map(|c| c.name.as_str()).collect();

    let primary_key = field_info.primary_key();
    let primary_key_name = &primary_key.name;
    let primary_key_ident = &primary_key.ident;
    let primary_key_type = &primary_key.ty;

    let all_idents: Vec<&Ident> = field_info.columns.iter().map(|c| &c.ident).collect();
    let non_key_idents: Vec<&Ident> = field_info.non_key_columns().map(|c| &c.ident).collect();

    quote! {
        impl dbstore_repository::TableMetadata for #name {
            type Id = #primary_key_type;

            fn table_name() -> &'static str {
                #table_name
            }

            fn columns() -> &'static [&'static str] {
                &[#(#column_names),*]
            }

            fn primary_key_field() -> &'static str {
                #primary_key_name
            }

            fn extract_id(&self) -> Self::Id {
                ::std::clone::Clone::clone(&self.#primary_key_ident)
            }

            fn bind_columns<'q>(
                &'q self,
                query: dbstore_repository::sqlx::query::Query<
                    'q,
                    dbstore_repository::sqlx::Postgres,
                    dbstore_repository::sqlx::postgres::PgArguments,
                >,
            ) -> dbstore_repository::sqlx::query::Query<
                'q,
                dbstore_repository::sqlx::Postgres,
                dbstore_repository::sqlx::postgres::PgArguments,
            > {
                query #(.bind(&self.#all_idents))*
            }

            fn bind_non_key_columns<'q>(
                &'q self,
                query: dbstore_repository::sqlx::query::Query<
                    'q,
                    dbstore_repository::sqlx::Postgres,
                    dbstore_repository::sqlx::postgres::PgArguments,
                >,
            ) -> dbstore_repository::sqlx::query::Query<
                'q,
                dbstore_repository::sqlx::Postgres,
                dbstore_repository::sqlx::postgres::PgArguments,
            > {
                query #(.bind(&self.#non_key_idents))*
            }
        }
    }
}

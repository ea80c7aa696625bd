//! Parsing utilities for table and field attributes
//!
//! This module handles the parsing of `#[table(...)]` and `#[primary_key]`
//! attributes and validation of table and column names.

use syn::{Attribute, Data, DeriveInput, Error, Fields, Ident, LitStr, Result, Type};

/// Validate table name and return syn::Error for better proc macro error handling
pub fn validate_table_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid table name '{}': {}", name, e)))
}

/// Validate column name and return syn::Error for better proc macro error handling
pub fn validate_column_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid column name '{}': {}", name, e)))
}

/// Names are always quoted in generated statements, so keywords are fine;
/// only PostgreSQL's unquoted identifier shape and length limit apply.
fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    // PostgreSQL truncates identifiers beyond this
    if name.len() > 63 {
        return Err(format!(
            "Name '{}' is too long: {} characters (max 63)",
            name,
            name.len()
        ));
    }

    let first_char = name
        .chars()
        .next()
        .ok_or_else(|| "Name cannot be empty".to_string())?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(format!(
            "Name '{}' must start with a letter or underscore",
            name
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("Name '{}' contains invalid characters: only alphanumeric characters and underscores are allowed", name));
    }

    Ok(())
}

#[derive(Debug)]
pub struct TableInfo {
    pub name: String,
}

pub struct ColumnInfo {
    pub ident: Ident,
    pub name: String,
    pub ty: Type,
}

pub struct FieldInfo {
    /// Every mapped column in declaration order
    pub columns: Vec<ColumnInfo>,
    /// Index into `columns` of the primary key
    pub primary_key: usize,
}

impl FieldInfo {
    pub fn primary_key(&self) -> &ColumnInfo {
        &self.columns[self.primary_key]
    }

    pub fn non_key_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.primary_key)
            .map(|(_, column)| column)
    }
}

pub fn parse_table_attributes(input: &DeriveInput) -> Result<TableInfo> {
    let mut table_name: Option<LitStr> = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("table") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                table_name = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported table attribute, expected `name = \"...\"`"))
            }
        })?;
    }

    let table_name = table_name.ok_or_else(|| {
        Error::new_spanned(
            &input.ident,
            "table attribute is required: add #[table(name = \"table_name\")] to your struct",
        )
    })?;

    validate_table_name_syn(&table_name.value(), table_name.span())?;

    Ok(TableInfo {
        name: table_name.value(),
    })
}

pub fn parse_field_attributes(input: &DeriveInput) -> Result<FieldInfo> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "TableMetadata cannot be derived for generic structs",
        ));
    }

    let fields_named = match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields_named) => fields_named,
            _ => {
                return Err(Error::new_spanned(
                    &input.ident,
                    "TableMetadata can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input.ident,
                "TableMetadata can only be derived for structs with named fields",
            ))
        }
    };

    let mut columns = Vec::new();
    let mut primary_key = None;

    for field in &fields_named.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;
        let name = ident.to_string();
        let name = name.strip_prefix("r#").unwrap_or(&name).to_string();
        validate_column_name_syn(&name, ident.span())?;

        if has_attribute(&field.attrs, "primary_key") {
            if primary_key.is_some() {
                return Err(Error::new_spanned(
                    field,
                    "only one field can be marked #[primary_key]",
                ));
            }
            primary_key = Some(columns.len());
        }

        columns.push(ColumnInfo {
            ident,
            name,
            ty: field.ty.clone(),
        });
    }

    let primary_key = primary_key.ok_or_else(|| {
        Error::new_spanned(
            &input.ident,
            "a primary key is required: mark one field with #[primary_key]",
        )
    })?;

    Ok(FieldInfo {
        columns,
        primary_key,
    })
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

//! Trait definitions
//!
//! This module contains the model-mapping trait every record type implements.

pub mod table_metadata;

pub use table_metadata::TableMetadata;

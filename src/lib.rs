//! # dbstore
//!
//! A generic PostgreSQL data-access layer: composable filter predicates,
//! SELECT/UPDATE/DELETE builders they apply to, keyset pagination and a
//! repository running CRUD and transactional operations over any mapped record.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dbstore::prelude::*;
//!
//! #[model]
//! #[table(name = "books")]
//! pub struct Book {
//!     #[primary_key]
//!     pub id: String,
//!     pub title: String,
//!     pub pages: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::new(
//!         "localhost".to_string(), 5432, "dbstore".to_string(),
//!         "postgres".to_string(), "password".to_string(),
//!         1, 5, 30, 600, 3600,
//!     );
//!
//!     let store = DbStore::new(config).await?;
//!     let books = store.repository();
//!
//!     let book = Book { id: "b-1".into(), title: "Rust".into(), pages: 300 };
//!     books.create(&book, false).await?;
//!
//!     let page = PaginationParams::next_page(10, "id", "b-1")?;
//!     let found: Vec<Book> = books
//!         .find_many_where(Some(&page), [contains("title", "rust"), gt("pages", 100)])
//!         .await?;
//!     println!("found {} books", found.len());
//!
//!     books
//!         .transaction(|tx| async move {
//!             tx.upsert(&[book]).await?;
//!             tx.delete_where::<Book>([lt("pages", 10)]).await?;
//!             Ok::<_, DbStoreError>(())
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::DbStore;
pub use errors::StoreError;

// Re-export centralized config
pub use dbstore_config::{AppConfig, DatabaseConfig};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated derive code to work correctly
pub use dbstore_config;
pub use dbstore_derive;
pub use dbstore_repository;

// Re-export external dependencies used in public API
pub use sqlx;

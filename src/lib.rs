//! # redditor-store
//!
//! A soft-delete CRUD store for redditors and the subreddits they bookmark.
//!
//! Every statement is produced by a schema-aware query builder that merges a
//! caller's patch into a default record, whitelists returned columns against
//! the entity schema, and numbers its placeholders `$1..$n` in value order.
//! Nothing is ever physically deleted: a delete stamps `delete_date`, and
//! reads hide stamped rows unless asked otherwise.
//!
//! ## Features
//!
//! - **Schema Registry**: Field order and defaults for each entity, passed explicitly
//! - **Query Builder**: SELECT / INSERT / UPDATE / soft DELETE with bound values
//! - **Column Whitelisting**: Unknown requested columns are dropped silently
//! - **Soft Delete**: `delete_date` stamping with a cascade from redditor to subreddits
//! - **Bootstrap DDL**: Tables, keys and epoch-seconds timestamp triggers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redditor_store::{QueryOptions, RedditorStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::from_env()?;
//!     let store = RedditorStore::new(config).await?;
//!
//!     let redditor = store
//!         .create_redditor(
//!             serde_json::json!({
//!                 "email_address": "ada@example.com",
//!                 "first_name": "Ada",
//!             }),
//!             &QueryOptions::new(),
//!         )
//!         .await?;
//!
//!     let id = redditor["id"].as_str().unwrap_or_default();
//!     store
//!         .create_redditor_subreddit(
//!             id,
//!             serde_json::json!({"subreddit": "rust", "favorite": true}),
//!             &QueryOptions::new(),
//!         )
//!         .await?;
//!
//!     let bookmarks = store
//!         .list_redditor_subreddits(id, &QueryOptions::new().with_columns("id,subreddit"))
//!         .await?;
//!     println!("{} bookmarks", bookmarks.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use redditor_store::StoreConfig;
//!
//! let config = StoreConfig::builder("postgres://localhost/reddit")
//!     .max_connections(10)    // Pool size (default: 5)
//!     .create_tables(true)    // Bootstrap tables on connect (default)
//!     .table_owner("reddit")  // ALTER ... OWNER TO for created objects
//!     .build();
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod schema;
pub mod sql;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{BuildError, Result, StoreError};
pub use models::{QueryOptions, Redditor, Subreddit};
pub use query::{QueryBuilder, QueryRequest, SqlQuery};
pub use schema::{EntitySchema, SchemaRegistry};
pub use store::RedditorStore;
pub use types::{Command, Condition, EntityKind, FieldDefinition, FieldType, Record};

// Re-export SQL utilities for advanced users
pub use sql::ddl::DdlGenerator;
pub use sql::sanitize::validate_identifier;

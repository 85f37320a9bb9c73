//! SQL utilities
//!
//! Provides placeholder rendering, DDL generation and identifier validation.

pub mod ddl;
pub mod params;
pub mod sanitize;

pub use ddl::DdlGenerator;
pub use params::{RenderedSql, SqlWriter};
pub use sanitize::{POSTGRES_RESERVED_WORDS, validate_identifier};

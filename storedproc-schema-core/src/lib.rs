//! Core library for storedproc-schema.
//!
//! Executes a SQL Server stored procedure, describes its first result set
//! and renders that description either as a pipe-delimited metadata dump or
//! as a T-SQL script (staging table, table type and load procedure).
//!
//! # Security Guarantees
//! - Connection strings are never logged or embedded in errors unredacted
//! - Passwords parsed from URLs are held in zeroizing containers
//! - Parameter values are bound, never spliced into statement text
//!
//! # Architecture
//! - [`adapters`]: the [`SchemaSource`] trait and its SQL Server adapter
//! - [`render`]: pure text renderers over a [`ResultSetSchema`]
//! - [`models`]: invocation, column and schema types shared by both

pub mod adapters;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod models;
pub mod render;
pub mod security;

// Re-export commonly used types
pub use adapters::{SchemaSource, SqlServerAdapter};
pub use error::{Result, SchemaReporterError, redact_connection_string};
pub use logging::init_logging;
pub use models::{
    ColumnDescriptor, InvocationRequest, LogicalType, MaxSize, OutputMode, ProcedureParameter,
    ResultSetSchema, SchemaTable,
};
pub use render::render;

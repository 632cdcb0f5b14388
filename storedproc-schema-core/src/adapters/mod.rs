//! Database adapters that describe a stored procedure's result set.
//!
//! The renderers only ever see a [`ResultSetSchema`]; how it was obtained is
//! the adapter's business. SQL Server is the only engine with an adapter.

use crate::{
    Result,
    models::{InvocationRequest, ResultSetSchema},
};
use async_trait::async_trait;

pub mod mssql;

pub use mssql::SqlServerAdapter;

/// Source of result-set metadata for a stored-procedure call.
///
/// # Contract
/// - Each call opens at most one connection and releases it before returning,
///   on success and on every error path.
/// - Columns are returned in result-set order; nothing is renamed or
///   reordered.
/// - No data rows are materialized.
///
/// # Example
///
/// ```rust,no_run
/// use storedproc_schema_core::adapters::{SchemaSource, SqlServerAdapter};
/// use storedproc_schema_core::models::InvocationRequest;
///
/// async fn describe() -> storedproc_schema_core::Result<()> {
///     let request = InvocationRequest::new(
///         "Server=tcp:localhost,1433;User Id=sa;Password=secret;TrustServerCertificate=true",
///         "dbo.GetWidgets",
///         &["Region|North".to_string()],
///     )?;
///
///     let schema = SqlServerAdapter::new().describe(&request).await?;
///     println!("{} columns", schema.columns.len());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Executes the request and describes its first result set.
    ///
    /// # Errors
    /// Connection, procedure execution and parameter binding failures.
    async fn describe(&self, request: &InvocationRequest) -> Result<ResultSetSchema>;

    /// Short engine name for logging
    fn database_type(&self) -> &'static str;
}

//! Output renderers for a described result set.
//!
//! - `raw`: pipe-delimited dump of the server's metadata table
//! - `script`: T-SQL DDL for a staging table, table type and load procedure
//!
//! Rendering is pure text generation. Output is assembled in memory and
//! written to the sink in one call, so a failed render writes nothing.

mod raw;
mod script;

pub use raw::render_schema_dump;
pub use script::render_script;

use crate::{
    Result,
    error::SchemaReporterError,
    models::{OutputMode, ResultSetSchema},
};
use std::io::Write;

/// Renders `schema` in the requested mode and writes it to `out`.
///
/// # Errors
/// Script generation fails for an empty column list; writing to `out` may
/// fail with an I/O error.
///
/// # Example
/// ```rust
/// use storedproc_schema_core::models::{
///     ColumnDescriptor, MaxSize, OutputMode, ResultSetSchema, SchemaTable,
/// };
/// use storedproc_schema_core::render::render;
///
/// let schema = ResultSetSchema {
///     columns: vec![ColumnDescriptor::new("Id", "int", MaxSize::Limited(4), false)],
///     schema_table: SchemaTable::default(),
/// };
///
/// let mut out: Vec<u8> = Vec::new();
/// render(&OutputMode::RawSchemaDump, &schema, &mut out)?;
/// assert_eq!(out, b"Id\n");
/// # Ok::<(), storedproc_schema_core::SchemaReporterError>(())
/// ```
pub fn render(mode: &OutputMode, schema: &ResultSetSchema, out: &mut impl Write) -> Result<()> {
    let text = match mode {
        OutputMode::RawSchemaDump => render_schema_dump(schema),
        OutputMode::ScriptGeneration {
            schema: target_schema,
            name,
        } => render_script(&schema.columns, target_schema, name)?,
    };

    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|source| SchemaReporterError::Io {
            context: "Failed to write output".to_string(),
            source,
        })
}

//! Pipe-delimited schema dump.

use crate::models::ResultSetSchema;

/// Field separator for the dump. Values are written as-is, so a value that
/// itself contains `|` is ambiguous.
const SEPARATOR: &str = "|";

/// Renders the header (result-set column names) followed by one line per
/// schema-table row. Every line ends with `\n`.
///
/// [`SchemaTable::fields`](crate::models::SchemaTable::fields) is not
/// written: the header names the result-set columns, and the rows carry the
/// server's metadata values unlabeled.
pub fn render_schema_dump(schema: &ResultSetSchema) -> String {
    let mut output = String::new();

    let header: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
    output.push_str(&header.join(SEPARATOR));
    output.push('\n');

    for row in &schema.schema_table.rows {
        output.push_str(&row.join(SEPARATOR));
        output.push('\n');
    }

    output
}

//! T-SQL script generation: a staging table, a matching table type and a
//! procedure that loads the table from a table-valued parameter.
//!
//! For base name `Widget` in schema `dbo` the script defines
//! `[dbo].[Widget]`, `[dbo].[WidgetType]` and `[dbo].[LoadWidget]`. The
//! table carries an extra `[DateInserted] [datetime] NOT NULL` column that
//! the load procedure fills with `GETDATE()`.

use crate::{
    Result,
    error::SchemaReporterError,
    identifier::quote_identifier,
    models::ColumnDescriptor,
};

/// Batch separator understood by `sqlcmd` and SSMS.
const BATCH_SEPARATOR: &str = "GO";

/// Audit column appended to the generated table only.
const DATE_INSERTED: &str = "DateInserted";

/// Name of the procedure's table-valued parameter.
const DATA_PARAMETER: &str = "@Data";

/// Line-oriented text buffer.
#[derive(Default)]
struct Script {
    text: String,
}

impl Script {
    fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    fn batch(&mut self, statement: impl AsRef<str>) {
        self.line(statement);
        self.line(BATCH_SEPARATOR);
    }
}

/// Names of the three generated objects, already quoted.
struct ObjectNames {
    table: String,
    table_type: String,
    procedure: String,
}

impl ObjectNames {
    fn new(schema: &str, name: &str) -> Self {
        let qualify = |object: &str| format!("{}.{}", quote_identifier(schema), quote_identifier(object));

        Self {
            table: qualify(name),
            table_type: qualify(&format!("{}Type", name)),
            procedure: qualify(&format!("Load{}", name)),
        }
    }
}

/// One column definition, e.g. `[Name] [varchar](50) NULL`.
fn column_definition(column: &ColumnDescriptor) -> String {
    format!(
        "{} {}{} {}",
        quote_identifier(&column.name),
        quote_identifier(&column.type_name),
        column.size_qualifier().unwrap_or_default(),
        if column.nullable { "NULL" } else { "NOT NULL" }
    )
}

/// Writes `header(`, the definitions separated by commas, and `)`.
fn column_block(script: &mut Script, header: &str, definitions: &[String]) {
    script.line(format!("{}(", header));
    let body: Vec<String> = definitions
        .iter()
        .map(|definition| format!("\t{}", definition))
        .collect();
    script.line(body.join(",\n"));
    script.line(")");
    script.line(BATCH_SEPARATOR);
}

/// Generates the full script for `columns` under `schema`.`name`.
///
/// Output is a pure function of its inputs: identical arguments produce
/// byte-identical scripts.
///
/// # Errors
/// Returns [`SchemaReporterError::ProcedureExecution`] when `columns` is
/// empty, or when a column has no name (`SELECT 1`), since neither can be
/// declared in T-SQL.
pub fn render_script(columns: &[ColumnDescriptor], schema: &str, name: &str) -> Result<String> {
    if columns.is_empty() {
        return Err(SchemaReporterError::procedure_failed(
            format!("{}.{}", schema, name),
            "procedure returned no result set",
        ));
    }

    if let Some((_, ordinal)) = columns
        .iter()
        .zip(1u32..)
        .find(|(column, _)| column.name.trim().is_empty())
    {
        return Err(SchemaReporterError::procedure_failed(
            format!("{}.{}", schema, name),
            format!(
                "result column {} has no name; alias it in the procedure to generate a script",
                ordinal
            ),
        ));
    }

    let names = ObjectNames::new(schema, name);
    let definitions: Vec<String> = columns.iter().map(column_definition).collect();
    let column_list: Vec<String> = columns
        .iter()
        .map(|column| quote_identifier(&column.name))
        .collect();
    let date_inserted = quote_identifier(DATE_INSERTED);

    let mut script = Script::default();

    script.batch(format!("DROP PROCEDURE IF EXISTS {}", names.procedure));
    script.batch(format!("DROP TABLE IF EXISTS {}", names.table));
    script.batch(format!("DROP TYPE IF EXISTS {}", names.table_type));

    let mut table_definitions = definitions.clone();
    table_definitions.push(format!("{} [datetime] NOT NULL", date_inserted));
    column_block(
        &mut script,
        &format!("CREATE TABLE {}", names.table),
        &table_definitions,
    );
    column_block(
        &mut script,
        &format!("CREATE TYPE {} AS TABLE", names.table_type),
        &definitions,
    );

    script.batch("SET ANSI_NULLS ON");
    script.batch("SET QUOTED_IDENTIFIER ON");

    script.line(format!("CREATE PROCEDURE {}", names.procedure));
    script.line(format!("\t{} {} READONLY", DATA_PARAMETER, names.table_type));
    script.line("AS");
    script.line("BEGIN");
    script.line("\tSET NOCOUNT ON;");
    script.line("");
    script.line(format!(
        "\tINSERT INTO {} ({}, {})",
        names.table,
        column_list.join(", "),
        date_inserted
    ));
    script.line(format!("\tSELECT {}, GETDATE()", column_list.join(", ")));
    script.line(format!("\tFROM {};", DATA_PARAMETER));
    script.line("END");
    script.line(BATCH_SEPARATOR);

    Ok(script.text)
}

//! SQL Server adapter built on `tiberius`.
//!
//! Every call to [`SqlServerAdapter::describe`] runs on one fresh connection:
//!
//! 1. resolve the procedure and check the supplied parameter names against
//!    its signature,
//! 2. describe the first result set with `sp_describe_first_result_set`,
//! 3. execute the procedure with bound values and read only the result-set
//!    metadata, which surfaces errors raised while the procedure runs.
//!
//! Procedures the server cannot describe statically (temp tables, dynamic
//! SQL) fall back to the metadata of the executed stream.
//!
//! # Security
//! - Parameter values are always bound, never spliced into statement text
//! - The connection string is only logged in redacted form

mod connection;
mod describe;
mod type_mapping;


use self::{
    connection::{SqlServerClient, build_config, connect},
    describe::{
        DESCRIBE_FIRST_RESULT_SET, DescribedColumn, LIST_PARAMETERS, RESOLVE_OBJECT_ID,
        check_signature, column_names, exec_statement, from_stream_columns,
        is_describe_unavailable, parameter_declarations, schema_row,
    },
};
use super::SchemaSource;
use crate::{
    Result,
    error::SchemaReporterError,
    models::{ColumnDescriptor, InvocationRequest, ProcedureParameter, ResultSetSchema, SchemaTable},
};
use async_trait::async_trait;
use tiberius::{ColumnType, Row, ToSql};
use tracing::{debug, info, warn};

/// Column name and driver type of an executed result set.
type StreamColumn = (String, ColumnType);

/// SQL Server implementation of [`SchemaSource`].
///
/// The adapter holds no connection state; each [`describe`](SchemaSource::describe)
/// call connects, runs the procedure and drops the connection before
/// returning.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerAdapter;

impl SqlServerAdapter {
    /// Creates a new adapter
    pub const fn new() -> Self {
        Self
    }
}

/// Resolves the procedure and checks the supplied parameter names.
async fn verify_signature(client: &mut SqlServerClient, request: &InvocationRequest) -> Result<()> {
    let procedure = request.procedure();
    let label = procedure.to_string();
    let quoted = procedure.quoted();

    let rows = client
        .query(RESOLVE_OBJECT_ID, &[&quoted])
        .await
        .map_err(|e| SchemaReporterError::from_driver(&label, e))?
        .into_first_result()
        .await
        .map_err(|e| SchemaReporterError::from_driver(&label, e))?;

    let object_id = match rows.first() {
        Some(row) => row
            .try_get::<i32, _>(0)
            .map_err(|e| SchemaReporterError::from_driver(&label, e))?,
        None => None,
    };

    let Some(object_id) = object_id else {
        return Err(SchemaReporterError::procedure_failed(
            &label,
            format!("Could not find stored procedure '{}'.", label),
        ));
    };
    debug!("Resolved {} to object id {}", label, object_id);

    let rows = client
        .query(LIST_PARAMETERS, &[&object_id])
        .await
        .map_err(|e| SchemaReporterError::from_driver(&label, e))?
        .into_first_result()
        .await
        .map_err(|e| SchemaReporterError::from_driver(&label, e))?;

    let mut signature = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(name) = row
            .try_get::<&str, _>(0)
            .map_err(|e| SchemaReporterError::from_driver(&label, e))?
        {
            signature.push(name.to_string());
        }
    }
    debug!("{} declares {} parameter(s)", label, signature.len());

    check_signature(procedure, request.parameters(), &signature)
}

/// Runs `sp_describe_first_result_set` and returns its field names and rows.
async fn describe_statically(
    client: &mut SqlServerClient,
    statement: &str,
    declarations: Option<&str>,
) -> tiberius::Result<(Vec<String>, Vec<Row>)> {
    let mut stream = client
        .query(DESCRIBE_FIRST_RESULT_SET, &[&statement, &declarations])
        .await?;

    let fields = stream.columns().await?.map(column_names).unwrap_or_default();
    let rows = stream.into_first_result().await?;

    Ok((fields, rows))
}

/// Executes the procedure and reads the metadata of its first result set.
/// Data rows are never fetched; the stream is dropped unread.
async fn execute_for_metadata(
    client: &mut SqlServerClient,
    statement: &str,
    parameters: &[ProcedureParameter],
) -> tiberius::Result<Vec<StreamColumn>> {
    let values: Vec<&str> = parameters.iter().map(ProcedureParameter::value).collect();
    let bound: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();

    let mut stream = client.query(statement, &bound).await?;
    let columns = stream
        .columns()
        .await?
        .map(|columns| {
            columns
                .iter()
                .map(|c| (c.name().to_string(), c.column_type()))
                .collect()
        })
        .unwrap_or_default();

    Ok(columns)
}

/// Builds the schema from described columns paired with their rendered rows.
/// Hidden columns stay in the schema table but get no descriptor.
pub(crate) fn assemble_described(
    fields: Vec<String>,
    described: Vec<(DescribedColumn, Vec<String>)>,
) -> ResultSetSchema {
    let mut columns = Vec::with_capacity(described.len());
    let mut rows = Vec::with_capacity(described.len());

    for (column, row) in described {
        rows.push(row);
        if !column.is_hidden {
            columns.push(column.into_descriptor());
        }
    }

    ResultSetSchema {
        columns,
        schema_table: SchemaTable { fields, rows },
    }
}

/// Whether the described column names differ from the executed result set.
pub(crate) fn names_differ(described: &[ColumnDescriptor], executed: &[StreamColumn]) -> bool {
    described.len() != executed.len()
        || described
            .iter()
            .zip(executed)
            .any(|(descriptor, (name, _))| descriptor.name != *name)
}

#[async_trait]
impl SchemaSource for SqlServerAdapter {
    async fn describe(&self, request: &InvocationRequest) -> Result<ResultSetSchema> {
        let config = build_config(request.connection_string())?;

        info!("Connecting to {}", request.safe_target());
        let mut client = connect(config).await?;
        debug!("Login succeeded");

        let procedure = request.procedure();
        let label = procedure.to_string();
        let parameters = request.parameters();

        if procedure.parts().len() <= 2 {
            verify_signature(&mut client, request).await?;
        } else {
            debug!("Skipping signature check for {}", label);
        }

        let statement = exec_statement(procedure, parameters);
        let declarations = parameter_declarations(parameters.len());
        debug!("Describing first result set of: {}", statement);

        let described =
            match describe_statically(&mut client, &statement, declarations.as_deref()).await {
                Ok(described) => Some(described),
                Err(e) if is_describe_unavailable(&e) => {
                    warn!(
                        "Result set of {} cannot be described statically, using executed metadata: {}",
                        label, e
                    );
                    None
                }
                Err(e) => return Err(SchemaReporterError::from_driver(&label, e)),
            };

        info!("Executing {} with {} parameter(s)", label, parameters.len());
        let executed = execute_for_metadata(&mut client, &statement, parameters)
            .await
            .map_err(|e| SchemaReporterError::from_driver(&label, e))?;
        drop(client);

        let schema = match described {
            Some((fields, rows)) => {
                let mut pairs = Vec::with_capacity(rows.len());
                for row in &rows {
                    pairs.push((DescribedColumn::from_row(row)?, schema_row(row)));
                }

                let schema = assemble_described(fields, pairs);
                if names_differ(&schema.columns, &executed) {
                    warn!(
                        "Described columns of {} differ from the executed result set ({} described, {} executed)",
                        label,
                        schema.columns.len(),
                        executed.len()
                    );
                }
                schema
            }
            None => {
                let (columns, schema_table) = from_stream_columns(&executed);
                ResultSetSchema {
                    columns,
                    schema_table,
                }
            }
        };

        if schema.columns.is_empty() {
            return Err(SchemaReporterError::procedure_failed(
                label,
                "procedure returned no result set",
            ));
        }

        info!("Described {} column(s) of {}", schema.columns.len(), label);
        Ok(schema)
    }

    fn database_type(&self) -> &'static str {
        "sqlserver"
    }
}

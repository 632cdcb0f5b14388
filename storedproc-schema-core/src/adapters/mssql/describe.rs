//! Statement text and metadata conversion for describing a procedure call.
//!
//! The procedure is described with `sys.sp_describe_first_result_set`, which
//! compiles the `EXEC` batch and reports one metadata row per result column
//! without running the procedure body.

use super::type_mapping::{
    cell_to_string, declared_length, native_type_name, split_declared_type, unsized_type_name,
};
use crate::{
    Result,
    error::SchemaReporterError,
    identifier::ObjectName,
    models::{ColumnDescriptor, MaxSize, ProcedureParameter, SchemaTable},
};
use tiberius::{Column, ColumnType, FromSql, Row};

/// Describes the first result set of the batch in `@P1`, whose parameters
/// are declared in `@P2`.
pub(crate) const DESCRIBE_FIRST_RESULT_SET: &str =
    "EXEC sys.sp_describe_first_result_set @tsql = @P1, @params = @P2";

/// Resolves a (quoted) object name to its object id.
pub(crate) const RESOLVE_OBJECT_ID: &str = "SELECT OBJECT_ID(@P1) AS object_id";

/// Lists the declared parameters of a procedure in signature order.
pub(crate) const LIST_PARAMETERS: &str = "SELECT name FROM sys.parameters \
     WHERE object_id = @P1 AND parameter_id > 0 \
     ORDER BY parameter_id";

/// Errors raised by the describe procedure itself (11500-11599), such as
/// "could not be determined because statement uses a temp table".
const DESCRIBE_ERROR_RANGE: std::ops::RangeInclusive<u32> = 11500..=11599;

/// Builds the `EXEC` text for the call, binding each value to `@P<n>`.
///
/// # Example
/// `EXEC [dbo].[GetWidgets] @Region = @P1, @Active = @P2`
pub(crate) fn exec_statement(procedure: &ObjectName, parameters: &[ProcedureParameter]) -> String {
    let mut statement = format!("EXEC {}", procedure.quoted());

    let assignments: Vec<String> = parameters
        .iter()
        .zip(1..)
        .map(|(param, ordinal)| format!("{} = @P{}", param.name(), ordinal))
        .collect();

    if !assignments.is_empty() {
        statement.push(' ');
        statement.push_str(&assignments.join(", "));
    }

    statement
}

/// The `@params` declaration matching [`exec_statement`], or `None` when the
/// call has no parameters.
pub(crate) fn parameter_declarations(count: usize) -> Option<String> {
    (count > 0).then(|| {
        (1..=count)
            .map(|ordinal| format!("@P{} nvarchar(max)", ordinal))
            .collect::<Vec<_>>()
            .join(", ")
    })
}

/// Whether a driver error means the server could not describe the result set
/// statically, so the executed stream's metadata has to be used instead.
pub(crate) fn is_describe_unavailable(error: &tiberius::error::Error) -> bool {
    error
        .code()
        .is_some_and(|code| DESCRIBE_ERROR_RANGE.contains(&code))
}

/// Checks every supplied parameter name against the procedure's signature,
/// ignoring case as the server does.
///
/// # Errors
/// Returns [`SchemaReporterError::ParameterBinding`] naming the first unknown
/// parameter and listing the accepted ones.
pub(crate) fn check_signature(
    procedure: &ObjectName,
    supplied: &[ProcedureParameter],
    signature: &[String],
) -> Result<()> {
    let unknown = supplied.iter().find(|param| {
        !signature
            .iter()
            .any(|declared| declared.eq_ignore_ascii_case(param.name()))
    });

    match unknown {
        None => Ok(()),
        Some(param) if signature.is_empty() => Err(SchemaReporterError::parameter_binding(
            procedure.to_string(),
            format!("'{}' was supplied but the procedure takes no parameters", param.name()),
        )),
        Some(param) => Err(SchemaReporterError::parameter_binding(
            procedure.to_string(),
            format!(
                "'{}' is not a parameter of the procedure (expected one of: {})",
                param.name(),
                signature.join(", ")
            ),
        )),
    }
}

fn get_field<'a, T>(row: &'a Row, field_name: &str) -> Result<Option<T>>
where
    T: FromSql<'a>,
{
    row.try_get(field_name).map_err(|e| {
        SchemaReporterError::procedure_failed(
            "sys.sp_describe_first_result_set",
            format!("unreadable field '{}': {}", field_name, e),
        )
    })
}

/// One row of `sp_describe_first_result_set` output, reduced to what the
/// descriptors need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DescribedColumn {
    pub(crate) name: Option<String>,
    pub(crate) is_hidden: bool,
    pub(crate) is_nullable: bool,
    pub(crate) system_type_name: String,
    pub(crate) max_length: i16,
}

impl DescribedColumn {
    /// Reads the describe row's fields by name.
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            name: get_field::<&str>(row, "name")?.map(str::to_string),
            is_hidden: get_field::<bool>(row, "is_hidden")?.unwrap_or(false),
            is_nullable: get_field::<bool>(row, "is_nullable")?.unwrap_or(true),
            system_type_name: get_field::<&str>(row, "system_type_name")?
                .unwrap_or_default()
                .to_string(),
            max_length: get_field::<i16>(row, "max_length")?.unwrap_or(-1),
        })
    }

    /// Converts to a descriptor. Character sizes come from the declared type
    /// (`nvarchar(50)` is 50 characters); other sizes are the reported bytes.
    pub(crate) fn into_descriptor(self) -> ColumnDescriptor {
        let (type_name, _) = split_declared_type(&self.system_type_name);
        let max_size = declared_length(&self.system_type_name)
            .unwrap_or_else(|| MaxSize::from_reported(i64::from(self.max_length)));

        ColumnDescriptor::new(
            self.name.unwrap_or_default(),
            type_name,
            max_size,
            self.is_nullable,
        )
    }
}

/// Column names of a result set, in server order.
pub(crate) fn column_names(columns: &[Column]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

/// One describe row rendered cell by cell.
pub(crate) fn schema_row(row: &Row) -> Vec<String> {
    row.cells().map(|(_, data)| cell_to_string(data)).collect()
}

/// Builds descriptors and a schema table from an executed stream's column
/// metadata, for procedures the server cannot describe statically.
///
/// Sizes are unknown, so character columns become `(max)` (`char` and
/// `nchar` widen to `varchar` and `nvarchar`), and every column is assumed
/// nullable. The schema table keeps the native type names.
pub(crate) fn from_stream_columns(columns: &[(String, ColumnType)]) -> (Vec<ColumnDescriptor>, SchemaTable) {
    let descriptors = columns
        .iter()
        .map(|(name, column_type)| {
            ColumnDescriptor::new(
                name.clone(),
                unsized_type_name(*column_type),
                MaxSize::Unbounded,
                true,
            )
        })
        .collect();

    let schema_table = SchemaTable {
        fields: vec![
            "column_ordinal".to_string(),
            "name".to_string(),
            "system_type_name".to_string(),
        ],
        rows: columns
            .iter()
            .zip(1u32..)
            .map(|((name, column_type), ordinal)| {
                vec![
                    ordinal.to_string(),
                    name.clone(),
                    native_type_name(*column_type).to_string(),
                ]
            })
            .collect(),
    };

    (descriptors, schema_table)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::LogicalType;

    fn params(tokens: &[&str]) -> Vec<ProcedureParameter> {
        tokens
            .iter()
            .map(|t| ProcedureParameter::parse(t).unwrap())
            .collect()
    }

    #[test]
    fn test_exec_statement_without_parameters() {
        let procedure = ObjectName::parse("dbo.GetWidgets").unwrap();
        assert_eq!(exec_statement(&procedure, &[]), "EXEC [dbo].[GetWidgets]");
        assert_eq!(parameter_declarations(0), None);
    }

    #[test]
    fn test_exec_statement_binds_values_positionally() {
        let procedure = ObjectName::parse("[Sales].[Get Orders]").unwrap();
        let parameters = params(&["Region|North", "@Active|1"]);

        assert_eq!(
            exec_statement(&procedure, &parameters),
            "EXEC [Sales].[Get Orders] @Region = @P1, @Active = @P2"
        );
        assert_eq!(
            parameter_declarations(2).as_deref(),
            Some("@P1 nvarchar(max), @P2 nvarchar(max)")
        );
    }

    #[test]
    fn test_exec_statement_never_contains_values() {
        let procedure = ObjectName::parse("p").unwrap();
        let parameters = params(&["x|'; DROP TABLE t; --"]);

        let statement = exec_statement(&procedure, &parameters);
        assert!(!statement.contains("DROP"));
    }

    #[test]
    fn test_check_signature_accepts_case_insensitive_names() {
        let procedure = ObjectName::parse("dbo.p").unwrap();
        let signature = vec!["@Region".to_string(), "@Active".to_string()];

        assert!(check_signature(&procedure, &params(&["region|x", "ACTIVE|1"]), &signature).is_ok());
        assert!(check_signature(&procedure, &[], &signature).is_ok());
    }

    #[test]
    fn test_check_signature_rejects_unknown_name() {
        let procedure = ObjectName::parse("dbo.p").unwrap();
        let signature = vec!["@Region".to_string()];

        let error = check_signature(&procedure, &params(&["Bogus|x"]), &signature).unwrap_err();
        assert!(matches!(error, SchemaReporterError::ParameterBinding { .. }));
        let message = error.to_string();
        assert!(message.contains("@Bogus"));
        assert!(message.contains("@Region"));
    }

    #[test]
    fn test_check_signature_procedure_without_parameters() {
        let procedure = ObjectName::parse("dbo.p").unwrap();

        let error = check_signature(&procedure, &params(&["x|1"]), &[]).unwrap_err();
        assert!(error.to_string().contains("takes no parameters"));
    }

    #[test]
    fn test_described_column_into_descriptor() {
        let column = DescribedColumn {
            name: Some("Name".to_string()),
            is_hidden: false,
            is_nullable: true,
            system_type_name: "nvarchar(50)".to_string(),
            max_length: 100,
        };

        let descriptor = column.into_descriptor();
        assert_eq!(descriptor.name, "Name");
        assert_eq!(descriptor.type_name, "nvarchar");
        assert_eq!(descriptor.logical_type, LogicalType::String);
        assert_eq!(descriptor.max_size, MaxSize::Limited(50));
        assert!(descriptor.nullable);
    }

    #[test]
    fn test_described_column_unbounded_and_fixed() {
        let notes = DescribedColumn {
            name: Some("Notes".to_string()),
            is_hidden: false,
            is_nullable: true,
            system_type_name: "varchar(max)".to_string(),
            max_length: -1,
        }
        .into_descriptor();
        assert_eq!(notes.max_size, MaxSize::Unbounded);

        let id = DescribedColumn {
            name: Some("Id".to_string()),
            is_hidden: false,
            is_nullable: false,
            system_type_name: "int".to_string(),
            max_length: 4,
        }
        .into_descriptor();
        assert_eq!(id.type_name, "int");
        assert_eq!(id.max_size, MaxSize::Limited(4));
        assert!(!id.nullable);
    }

    #[test]
    fn test_from_stream_columns() {
        let columns = vec![
            ("Id".to_string(), ColumnType::Int4),
            ("Name".to_string(), ColumnType::NVarchar),
        ];

        let (descriptors, table) = from_stream_columns(&columns);

        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[1].type_name, "nvarchar");
        assert_eq!(descriptors[1].size_qualifier().as_deref(), Some("(max)"));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["1", "Id", "int"]);
    }

    #[test]
    fn test_from_stream_columns_widens_fixed_width_characters() {
        let columns = vec![
            ("Code".to_string(), ColumnType::BigChar),
            ("Initials".to_string(), ColumnType::NChar),
        ];

        let (descriptors, table) = from_stream_columns(&columns);
        let script = crate::render::render_script(&descriptors, "dbo", "Codes").unwrap();

        assert!(script.contains("\t[Code] [varchar](max) NULL,"));
        assert!(script.contains("\t[Initials] [nvarchar](max) NULL\n)"));
        assert!(!script.contains("[char](max)"));
        assert!(!script.contains("[nchar](max)"));
        assert_eq!(table.rows[0], vec!["1", "Code", "char"]);
    }
}

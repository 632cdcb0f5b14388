//! Data model for a single schema-reporting run.
//!
//! The invocation request is built once from CLI input and never changes.
//! Column descriptors and the schema table are produced by the executor and
//! consumed by the renderers; nothing here is persisted.

use crate::{
    Result,
    error::{SchemaReporterError, redact_connection_string},
    identifier::ObjectName,
};
use std::fmt;

/// A named stored-procedure argument taken from a `name|value` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureParameter {
    name: String,
    value: String,
}

impl ProcedureParameter {
    /// Parses a `name|value` token.
    ///
    /// The name gets a leading `@` if it lacks one. The value is taken as-is,
    /// including surrounding whitespace, and may be empty.
    ///
    /// # Errors
    /// Returns [`SchemaReporterError::ParameterFormat`] unless the token
    /// splits into exactly two parts with a non-empty, identifier-shaped name.
    ///
    /// # Example
    /// ```rust
    /// use storedproc_schema_core::models::ProcedureParameter;
    ///
    /// let param = ProcedureParameter::parse("Region|North").unwrap();
    /// assert_eq!(param.name(), "@Region");
    /// assert_eq!(param.value(), "North");
    ///
    /// assert!(ProcedureParameter::parse("justkey").is_err());
    /// ```
    pub fn parse(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split('|').collect();
        let [name, value] = parts.as_slice() else {
            return Err(SchemaReporterError::parameter_format(
                token,
                format!(
                    "expected exactly one '|' between name and value, found {}",
                    parts.len().saturating_sub(1)
                ),
            ));
        };

        let name = name.trim();
        let bare = name.strip_prefix('@').unwrap_or(name);
        if bare.is_empty() {
            return Err(SchemaReporterError::parameter_format(
                token,
                "parameter name is empty",
            ));
        }
        if !bare
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$'))
        {
            return Err(SchemaReporterError::parameter_format(
                token,
                "parameter name may only contain letters, digits, '_', '@', '#' or '$'",
            ));
        }

        Ok(Self {
            name: format!("@{}", bare),
            value: (*value).to_string(),
        })
    }

    /// Parameter name including the leading `@`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter value, bound as a string.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// One stored-procedure call: where to connect, what to run, with what.
///
/// # Security
/// The `Debug` output redacts the connection string password.
#[derive(Clone)]
pub struct InvocationRequest {
    connection_string: String,
    procedure: ObjectName,
    parameters: Vec<ProcedureParameter>,
}

impl InvocationRequest {
    /// Builds a request from raw CLI values.
    ///
    /// # Errors
    /// Returns a usage error for an empty connection string or a malformed
    /// procedure name, and a parameter format error for any bad token.
    pub fn new(connection_string: &str, procedure: &str, parameter_tokens: &[String]) -> Result<Self> {
        if connection_string.trim().is_empty() {
            return Err(SchemaReporterError::usage("connection string cannot be empty"));
        }

        let procedure = ObjectName::parse(procedure)?;
        let parameters = parameter_tokens
            .iter()
            .map(|token| ProcedureParameter::parse(token))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            connection_string: connection_string.to_string(),
            procedure,
            parameters,
        })
    }

    /// Raw connection string. Never log this; see [`Self::safe_target`].
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// The stored procedure to execute.
    pub fn procedure(&self) -> &ObjectName {
        &self.procedure
    }

    /// Parameters in command-line order.
    pub fn parameters(&self) -> &[ProcedureParameter] {
        &self.parameters
    }

    /// Connection target with the password masked, safe for logs.
    pub fn safe_target(&self) -> String {
        redact_connection_string(&self.connection_string)
    }
}

impl fmt::Debug for InvocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationRequest")
            .field("connection_string", &self.safe_target())
            .field("procedure", &self.procedure)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Which renderer consumes the described result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Column names followed by the server's raw metadata rows
    RawSchemaDump,
    /// Table, table type and load procedure DDL
    ScriptGeneration {
        /// Target schema for every generated object
        schema: String,
        /// Base name: table `<name>`, type `<name>Type`, proc `Load<name>`
        name: String,
    },
}

/// Coarse classification of a native SQL Server type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    /// Character data
    String,
    /// Exact and approximate numerics, including `bit`
    Number,
    /// Date and time types
    Date,
    /// Binary, GUID, spatial, variant and user-defined types
    Other,
}

impl LogicalType {
    /// Classifies a bare native type name such as `nvarchar` or `datetime2`.
    pub fn classify(type_name: &str) -> Self {
        match type_name.to_ascii_lowercase().as_str() {
            "char" | "varchar" | "nchar" | "nvarchar" | "text" | "ntext" | "xml" | "sysname" => {
                Self::String
            }
            "bit" | "tinyint" | "smallint" | "int" | "bigint" | "decimal" | "numeric"
            | "money" | "smallmoney" | "float" | "real" => Self::Number,
            "date" | "time" | "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" => {
                Self::Date
            }
            _ => Self::Other,
        }
    }
}

/// Declared maximum size of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxSize {
    /// A finite size; characters for character types
    Limited(u32),
    /// `(max)` types
    Unbounded,
}

impl MaxSize {
    /// Interprets a raw length reported by the server, where `-1` means
    /// `(max)`.
    pub fn from_reported(length: i64) -> Self {
        u32::try_from(length).map_or(Self::Unbounded, Self::Limited)
    }
}

impl fmt::Display for MaxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(size) => write!(f, "{}", size),
            Self::Unbounded => f.write_str("max"),
        }
    }
}

/// Structural description of one result-set column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as returned by the procedure
    pub name: String,
    /// Bare native type name, e.g. `varchar`
    pub type_name: String,
    /// Classification derived from `type_name`
    pub logical_type: LogicalType,
    /// Declared maximum size
    pub max_size: MaxSize,
    /// Whether the column allows NULL
    pub nullable: bool,
}

impl ColumnDescriptor {
    /// Creates a descriptor, classifying the type once.
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        max_size: MaxSize,
        nullable: bool,
    ) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            logical_type: LogicalType::classify(&type_name),
            type_name,
            max_size,
            nullable,
        }
    }

    /// Whether the type is character data declared with a length
    /// (`char`, `varchar`, `nchar`, `nvarchar`).
    pub fn is_length_qualified(&self) -> bool {
        self.logical_type == LogicalType::String
            && matches!(
                self.type_name.to_ascii_lowercase().as_str(),
                "char" | "varchar" | "nchar" | "nvarchar"
            )
    }

    /// The `(size)` suffix for generated DDL, if this type takes one.
    pub fn size_qualifier(&self) -> Option<String> {
        self.is_length_qualified()
            .then(|| format!("({})", self.max_size))
    }
}

/// The raw metadata table the server produced while describing a result set.
///
/// Field names are the metadata columns; each row describes one result-set
/// column with every value already rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTable {
    /// Metadata column names, for callers that read rows by label. The
    /// pipe-delimited dump does not print them.
    pub fields: Vec<String>,
    /// One entry per described column, aligned with `fields`
    pub rows: Vec<Vec<String>>,
}

/// Everything the executor learned about a procedure's first result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSetSchema {
    /// Visible columns in result-set order
    pub columns: Vec<ColumnDescriptor>,
    /// Raw metadata used by the schema dump
    pub schema_table: SchemaTable,
}

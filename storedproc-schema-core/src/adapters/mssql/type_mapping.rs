//! SQL Server type names, declared sizes and cell formatting.
//!
//! Declared type names come from the server as text (`nvarchar(50)`,
//! `decimal(18,2)`, `varchar(max)`). When only the TDS column metadata of an
//! executed stream is available, driver column types are mapped back to
//! native names instead.

use crate::models::MaxSize;
use tiberius::{ColumnData, ColumnType, FromSql};

/// Splits a declared type into its bare name and argument list.
///
/// `"nvarchar(50)"` becomes `("nvarchar", Some("50"))`, `"int"` becomes
/// `("int", None)`.
pub(crate) fn split_declared_type(declared: &str) -> (&str, Option<&str>) {
    let declared = declared.trim();
    match declared.split_once('(') {
        Some((base, rest)) => (
            base.trim(),
            Some(rest.trim_end().trim_end_matches(')').trim()),
        ),
        None => (declared, None),
    }
}

/// The declared length of a type, if its arguments are a single length.
///
/// `(max)` maps to [`MaxSize::Unbounded`]. Multi-argument types such as
/// `decimal(18,2)` have no declared length.
pub(crate) fn declared_length(declared: &str) -> Option<MaxSize> {
    let (_, args) = split_declared_type(declared);
    let args = args?;

    if args.eq_ignore_ascii_case("max") {
        return Some(MaxSize::Unbounded);
    }
    args.parse::<u32>().ok().map(MaxSize::Limited)
}

/// Native type name for a TDS column type.
///
/// Variable-width TDS types (`Intn`, `Floatn`, `Datetimen`) do not carry
/// their width here, so they map to the widest common member of the family.
pub(crate) const fn native_type_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Bit | ColumnType::Bitn => "bit",
        ColumnType::Int1 => "tinyint",
        ColumnType::Int2 => "smallint",
        ColumnType::Int4 | ColumnType::Intn => "int",
        ColumnType::Int8 => "bigint",
        ColumnType::Float4 => "real",
        ColumnType::Float8 | ColumnType::Floatn => "float",
        ColumnType::Money => "money",
        ColumnType::Money4 => "smallmoney",
        ColumnType::Datetime4 => "smalldatetime",
        ColumnType::Datetime | ColumnType::Datetimen => "datetime",
        ColumnType::Daten => "date",
        ColumnType::Timen => "time",
        ColumnType::Datetime2 => "datetime2",
        ColumnType::DatetimeOffsetn => "datetimeoffset",
        ColumnType::Guid => "uniqueidentifier",
        ColumnType::Decimaln => "decimal",
        ColumnType::Numericn => "numeric",
        ColumnType::BigVarBin | ColumnType::Udt => "varbinary",
        ColumnType::BigBinary => "binary",
        ColumnType::BigVarChar => "varchar",
        ColumnType::BigChar => "char",
        ColumnType::NVarchar => "nvarchar",
        ColumnType::NChar => "nchar",
        ColumnType::Xml => "xml",
        ColumnType::Text => "text",
        ColumnType::NText => "ntext",
        ColumnType::Image => "image",
        ColumnType::Null | ColumnType::SSVariant => "sql_variant",
    }
}

/// Type name for a column whose size is unknown and will be declared
/// `(max)`. Fixed-width character types do not accept `max`, so they widen
/// to their variable-width counterparts.
pub(crate) const fn unsized_type_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::BigChar => "varchar",
        ColumnType::NChar => "nvarchar",
        other => native_type_name(other),
    }
}

fn format_optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_chrono<'a, T>(data: &'a ColumnData<'static>) -> String
where
    T: FromSql<'a> + ToString,
{
    T::from_sql(data).ok().flatten().map(|v| v.to_string()).unwrap_or_default()
}

/// Renders one metadata cell as text for the pipe-delimited dump.
///
/// NULL becomes an empty field and bits render as `True` / `False`.
pub(crate) fn cell_to_string(data: &ColumnData<'static>) -> String {
    match data {
        ColumnData::U8(v) => format_optional(*v),
        ColumnData::I16(v) => format_optional(*v),
        ColumnData::I32(v) => format_optional(*v),
        ColumnData::I64(v) => format_optional(*v),
        ColumnData::F32(v) => format_optional(*v),
        ColumnData::F64(v) => format_optional(*v),
        ColumnData::Bit(v) => v
            .map(|b| if b { "True" } else { "False" }.to_string())
            .unwrap_or_default(),
        ColumnData::String(v) => v.as_deref().map(str::to_string).unwrap_or_default(),
        ColumnData::Guid(v) => format_optional(*v),
        ColumnData::Binary(v) => v
            .as_deref()
            .map(|bytes| {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                format!("0x{}", hex)
            })
            .unwrap_or_default(),
        ColumnData::Numeric(v) => format_optional(*v),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|xml| (**xml).clone().into_string())
            .unwrap_or_default(),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            format_chrono::<chrono::NaiveDateTime>(data)
        }
        ColumnData::Date(_) => format_chrono::<chrono::NaiveDate>(data),
        ColumnData::Time(_) => format_chrono::<chrono::NaiveTime>(data),
        ColumnData::DateTimeOffset(_) => {
            format_chrono::<chrono::DateTime<chrono::FixedOffset>>(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn test_split_declared_type() {
        assert_eq!(split_declared_type("nvarchar(50)"), ("nvarchar", Some("50")));
        assert_eq!(split_declared_type("decimal(18,2)"), ("decimal", Some("18,2")));
        assert_eq!(split_declared_type("varchar(max)"), ("varchar", Some("max")));
        assert_eq!(split_declared_type("int"), ("int", None));
        assert_eq!(split_declared_type(" datetime2(7) "), ("datetime2", Some("7")));
    }

    #[test]
    fn test_declared_length() {
        assert_eq!(declared_length("varchar(50)"), Some(MaxSize::Limited(50)));
        assert_eq!(declared_length("nvarchar(MAX)"), Some(MaxSize::Unbounded));
        assert_eq!(declared_length("decimal(18,2)"), None);
        assert_eq!(declared_length("int"), None);
    }

    #[test]
    fn test_native_type_name() {
        assert_eq!(native_type_name(ColumnType::Int4), "int");
        assert_eq!(native_type_name(ColumnType::BigVarChar), "varchar");
        assert_eq!(native_type_name(ColumnType::NVarchar), "nvarchar");
        assert_eq!(native_type_name(ColumnType::Datetime2), "datetime2");
        assert_eq!(native_type_name(ColumnType::Guid), "uniqueidentifier");
        assert_eq!(native_type_name(ColumnType::SSVariant), "sql_variant");
    }

    #[test]
    fn test_unsized_type_name() {
        assert_eq!(unsized_type_name(ColumnType::BigChar), "varchar");
        assert_eq!(unsized_type_name(ColumnType::NChar), "nvarchar");
        assert_eq!(unsized_type_name(ColumnType::NVarchar), "nvarchar");
        assert_eq!(unsized_type_name(ColumnType::Int4), "int");
    }

    #[test]
    fn test_cell_to_string_scalars() {
        assert_eq!(cell_to_string(&ColumnData::I32(Some(42))), "42");
        assert_eq!(cell_to_string(&ColumnData::I16(Some(-1))), "-1");
        assert_eq!(cell_to_string(&ColumnData::U8(Some(7))), "7");
        assert_eq!(cell_to_string(&ColumnData::Bit(Some(true))), "True");
        assert_eq!(cell_to_string(&ColumnData::Bit(Some(false))), "False");
        assert_eq!(
            cell_to_string(&ColumnData::String(Some(Cow::Borrowed("varchar(50)")))),
            "varchar(50)"
        );
        assert_eq!(
            cell_to_string(&ColumnData::Binary(Some(Cow::Owned(vec![0x0A, 0xFF])))),
            "0x0AFF"
        );
    }

    #[test]
    fn test_cell_to_string_null_is_empty() {
        assert_eq!(cell_to_string(&ColumnData::I32(None)), "");
        assert_eq!(cell_to_string(&ColumnData::String(None)), "");
        assert_eq!(cell_to_string(&ColumnData::Bit(None)), "");
    }
}

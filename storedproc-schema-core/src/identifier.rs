//! T-SQL identifier quoting and multi-part name parsing.
//!
//! Every identifier this crate emits, either in generated scripts or in the
//! `EXEC` text sent to the server, goes through [`quote_identifier`].

use crate::{Result, error::SchemaReporterError};
use std::fmt;

/// Maximum parts in a T-SQL object name (`server.database.schema.object`).
const MAX_NAME_PARTS: usize = 4;

/// Wraps an identifier in brackets, doubling any closing bracket inside it.
///
/// # Example
/// ```rust
/// use storedproc_schema_core::identifier::quote_identifier;
///
/// assert_eq!(quote_identifier("Name"), "[Name]");
/// assert_eq!(quote_identifier("odd]name"), "[odd]]name]");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    format!("[{}]", identifier.replace(']', "]]"))
}

/// A possibly multi-part object name such as `dbo.GetWidgets` or
/// `[Sales].[Get Orders]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    parts: Vec<String>,
}

impl ObjectName {
    /// Parses a dotted object name. Parts may be bracket-quoted, in which
    /// case they can contain dots and doubled closing brackets.
    ///
    /// # Errors
    /// Returns a usage error for empty parts, unbalanced brackets, or more
    /// than four parts.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            SchemaReporterError::usage(format!("invalid object name '{}': {}", input, reason))
        };

        let mut parts = Vec::new();
        let mut chars = input.trim().chars().peekable();

        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}

            let part = if chars.next_if_eq(&'[').is_some() {
                let mut part = String::new();
                loop {
                    match chars.next() {
                        Some(']') if chars.next_if_eq(&']').is_some() => part.push(']'),
                        Some(']') => break,
                        Some(c) => part.push(c),
                        None => return Err(invalid("unterminated '['")),
                    }
                }
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
                part
            } else {
                let mut part = String::new();
                while let Some(c) = chars.next_if(|c| *c != '.') {
                    if c == '[' || c == ']' {
                        return Err(invalid("unexpected bracket"));
                    }
                    part.push(c);
                }
                part.trim().to_string()
            };

            if part.is_empty() {
                return Err(invalid("empty name part"));
            }
            parts.push(part);

            match chars.next() {
                None => break,
                Some('.') => {}
                Some(_) => return Err(invalid("expected '.' after ']'")),
            }
        }

        if parts.len() > MAX_NAME_PARTS {
            return Err(invalid("too many name parts"));
        }

        Ok(Self { parts })
    }

    /// The unquoted name parts, outermost first.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// The name with every part bracket-quoted, e.g. `[dbo].[GetWidgets]`.
    pub fn quoted(&self) -> String {
        self.parts
            .iter()
            .map(|part| quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

//! Credential protection for connection strings.
//!
//! - `credentials`: login container with automatic memory zeroing
//! - `connection`: URL parsing that separates credentials from the target
//!
//! Redaction of whole connection strings for logs lives in
//! [`crate::error::redact_connection_string`].

mod connection;
mod credentials;

pub use connection::{ConnectionInfo, parse_connection_url};
pub use credentials::Credentials;

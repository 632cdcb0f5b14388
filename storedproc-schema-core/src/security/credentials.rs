//! Credential container with automatic memory zeroing.
//!
//! Credentials taken from a connection URL live in `Zeroizing` containers
//! until they are handed to the driver's login.

use zeroize::{Zeroize, Zeroizing};

/// SQL login credentials that are cleared from memory on drop.
///
/// # Example
///
/// ```rust
/// use storedproc_schema_core::security::Credentials;
///
/// let creds = Credentials::new("sa".to_string(), Some("secret".to_string()));
/// assert_eq!(creds.username(), "sa");
/// assert!(creds.has_password());
/// ```
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credentials {
    username: Zeroizing<String>,
    password: Zeroizing<Option<String>>,
}

impl Credentials {
    /// Creates new credentials with automatic memory zeroing.
    pub fn new(username: String, password: Option<String>) -> Self {
        Self {
            username: Zeroizing::new(username),
            password: Zeroizing::new(password),
        }
    }

    /// Login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password, empty when none was given.
    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }

    /// Checks if a password is present without exposing it.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username())
            .field("password", &self.has_password().then_some("****"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let creds = Credentials::new("sa".to_string(), Some("secret".to_string()));
        assert_eq!(creds.username(), "sa");
        assert_eq!(creds.password(), "secret");
        assert!(creds.has_password());
    }

    #[test]
    fn test_credentials_no_password() {
        let creds = Credentials::new("sa".to_string(), None);
        assert_eq!(creds.password(), "");
        assert!(!creds.has_password());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("sa".to_string(), Some("secret".to_string()));
        let debug = format!("{:?}", creds);

        assert!(debug.contains("sa"));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("****"));
    }
}

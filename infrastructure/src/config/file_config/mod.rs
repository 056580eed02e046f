//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types at
//! the edges.

mod auth;
mod host;
mod permissions;
mod server;

pub use auth::{FileAuthConfig, FileTokenConfig};
pub use host::FileHostConfig;
pub use permissions::FilePermissionsConfig;
pub use server::FileServerConfig;

use hacrud_application::CrudConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("host.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("host.address cannot be empty")]
    EmptyHostAddress,

    #[error("server.bind '{0}' is not a valid socket address")]
    InvalidBind(String),

    #[error("auth.tokens[{0}].token cannot be empty")]
    EmptyToken(usize),

    #[error("auth.tokens[{0}] duplicates an earlier token")]
    DuplicateToken(usize),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Host platform connection
    pub host: FileHostConfig,
    /// Operation feature flags
    pub permissions: FilePermissionsConfig,
    /// REST listener
    pub server: FileServerConfig,
    /// Static bearer tokens
    pub auth: FileAuthConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.host.timeout_seconds == 0 {
            issues.push(ConfigValidationError::InvalidTimeout);
        }
        if self.host.address.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyHostAddress);
        }
        if self.server.bind.parse::<SocketAddr>().is_err() {
            issues.push(ConfigValidationError::InvalidBind(self.server.bind.clone()));
        }

        let mut seen = HashSet::new();
        for (i, entry) in self.auth.tokens.iter().enumerate() {
            if entry.token.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyToken(i));
            } else if !seen.insert(entry.token.as_str()) {
                issues.push(ConfigValidationError::DuplicateToken(i));
            }
        }

        issues
    }

    /// Application-level CRUD behavior derived from this file.
    pub fn crud_config(&self) -> CrudConfig {
        CrudConfig::default()
            .with_permissions(self.permissions.into())
            .with_command_timeout(self.host.timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[host]
address = "ha.local:8123"
access_token = "abc"
timeout_seconds = 3

[permissions]
create = true
update = true

[server]
bind = "0.0.0.0:9000"

[[auth.tokens]]
token = "reader"

[[auth.tokens]]
token = "boss"
admin = true
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host.address, "ha.local:8123");
        assert_eq!(config.host.access_token.as_deref(), Some("abc"));
        assert!(config.permissions.read);
        assert!(config.permissions.create);
        assert!(!config.permissions.delete);
        assert_eq!(config.auth.tokens.len(), 2);
        assert!(!config.auth.tokens[0].admin);
        assert!(config.auth.tokens[1].admin);
        assert!(config.validate().is_empty());

        let crud = config.crud_config();
        assert_eq!(crud.command_timeout, Duration::from_secs(3));
        assert!(crud.permissions.update);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[host]\ntimeout_seconds = 30\n").unwrap();
        assert_eq!(config.host.timeout_seconds, 30);
        assert_eq!(config.host.address, "127.0.0.1:8123");
        assert_eq!(config.server.bind, "127.0.0.1:8124");
    }

    #[test]
    fn test_default_config_is_read_only_and_valid() {
        let config = FileConfig::default();
        assert!(config.permissions.read);
        assert!(!config.permissions.create);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_every_issue() {
        let mut config = FileConfig::default();
        config.host.timeout_seconds = 0;
        config.host.address = " ".into();
        config.server.bind = "nowhere".into();
        config.auth.tokens = vec![
            FileTokenConfig {
                token: "a".into(),
                admin: false,
            },
            FileTokenConfig {
                token: "".into(),
                admin: true,
            },
            FileTokenConfig {
                token: "a".into(),
                admin: true,
            },
        ];
        assert_eq!(
            config.validate(),
            vec![
                ConfigValidationError::InvalidTimeout,
                ConfigValidationError::EmptyHostAddress,
                ConfigValidationError::InvalidBind("nowhere".into()),
                ConfigValidationError::EmptyToken(1),
                ConfigValidationError::DuplicateToken(2),
            ]
        );
    }
}

//! Bearer token table from TOML (`[[auth.tokens]]`)

use serde::{Deserialize, Serialize};

/// Raw auth configuration from TOML
///
/// # Example
///
/// ```toml
/// [[auth.tokens]]
/// token = "dashboard-readonly"
///
/// [[auth.tokens]]
/// token = "ops-admin"
/// admin = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuthConfig {
    pub tokens: Vec<FileTokenConfig>,
}

/// One accepted bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTokenConfig {
    pub token: String,
    #[serde(default)]
    pub admin: bool,
}

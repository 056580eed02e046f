//! Host connection configuration from TOML (`[host]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw host configuration from TOML
///
/// # Example
///
/// ```toml
/// [host]
/// address = "homeassistant.local:8123"
/// access_token = "eyJ0eXAiOi..."
/// timeout_seconds = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHostConfig {
    /// `host:port` of the platform's command socket
    pub address: String,
    /// Long-lived access token; when set, the connection is authenticated first
    pub access_token: Option<String>,
    /// Per-command timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for FileHostConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8123".to_string(),
            access_token: None,
            timeout_seconds: 10,
        }
    }
}

impl FileHostConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

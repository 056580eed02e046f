//! Host protocol message types
//!
//! Requests go out as a flat JSON object, `{"id": 7, "type": "counter/create", ...fields}`.
//! Responses come back as `{"id": 7, "type": "result", "success": true, "result": ...}`
//! or with `"success": false` and an `error` object carrying `code` and `message`.

use crate::helper::HelperDomain;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Action half of a `{domain}/{action}` message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelperAction {
    List,
    Create,
    Update,
    Delete,
}

impl HelperAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HelperAction::List => "list",
            HelperAction::Create => "create",
            HelperAction::Update => "update",
            HelperAction::Delete => "delete",
        }
    }
}

impl std::fmt::Display for HelperAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outbound command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandEnvelope {
    pub id: u64,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl CommandEnvelope {
    pub fn new(
        id: u64,
        domain: HelperDomain,
        action: HelperAction,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            message_type: format!("{domain}/{action}"),
            payload,
        }
    }
}

/// Error object reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

impl BackendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Inbound response, matched to its command by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub id: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BackendError>,
}

impl ResultEnvelope {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: BackendError) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(error),
        }
    }

    /// Split into the domain payload or the backend's error.
    ///
    /// A failure without an error object is malformed.
    pub fn into_result(self) -> Result<Value, ProtocolError> {
        match (self.success, self.error) {
            (true, _) => Ok(self.result.unwrap_or(Value::Null)),
            (false, Some(error)) => Err(ProtocolError::Backend(error)),
            (false, None) => Err(ProtocolError::MalformedResponse(format!(
                "response {} reported failure without an error object",
                self.id
            ))),
        }
    }
}

/// Failure of a single correlated command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Host did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Connection to host lost")]
    ConnectionLost,

    #[error("Host rejected command: {0}")]
    Backend(BackendError),

    #[error("Malformed host response: {0}")]
    MalformedResponse(String),
}

impl ProtocolError {
    /// Whether the backend is unavailable, as opposed to having answered.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ProtocolError::Timeout(_) | ProtocolError::ConnectionLost)
    }
}

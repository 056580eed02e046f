//! Response translator and external error taxonomy
//!
//! The single place where tagged failures from each stage become the external
//! error shape shared by the REST and tool-call adapters.
//!
//! | Source | Kind | Code | HTTP |
//! |--------|------|------|------|
//! | `ValidationError`, unknown domain filter, backend `invalid_format` | BadRequest | `bad_request` | 400 |
//! | `PermissionDenial::FlagDisabled` | Forbidden | `forbidden` | 403 |
//! | `PermissionDenial::AdminRequired` | Unauthorized | `unauthorized` | 401 |
//! | backend `not_found`, unknown id | NotFound | `not_found` | 404 |
//! | backend `duplicate_name` / `name_in_use` / `id_exists` | Conflict | `conflict` | 409 |
//! | `Timeout`, `ConnectionLost` | ServiceUnavailable | `service_unavailable` | 503 |
//! | anything else from the backend, malformed responses | Internal | `internal_error` | 500 |

use hacrud_domain::{
    BackendError, HelperAction, HelperDescriptor, HelperDomain, PermissionDenial, ProtocolError,
    UnknownDomain, ValidationError,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

/// External error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalErrorKind {
    BadRequest,
    Forbidden,
    Unauthorized,
    NotFound,
    Conflict,
    ServiceUnavailable,
    Internal,
}

impl ExternalErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ExternalErrorKind::BadRequest => "bad_request",
            ExternalErrorKind::Forbidden => "forbidden",
            ExternalErrorKind::Unauthorized => "unauthorized",
            ExternalErrorKind::NotFound => "not_found",
            ExternalErrorKind::Conflict => "conflict",
            ExternalErrorKind::ServiceUnavailable => "service_unavailable",
            ExternalErrorKind::Internal => "internal_error",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ExternalErrorKind::BadRequest => 400,
            ExternalErrorKind::Unauthorized => 401,
            ExternalErrorKind::Forbidden => 403,
            ExternalErrorKind::NotFound => 404,
            ExternalErrorKind::Conflict => 409,
            ExternalErrorKind::Internal => 500,
            ExternalErrorKind::ServiceUnavailable => 503,
        }
    }
}

/// Uniform failure returned by every CRUD operation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ExternalError {
    #[serde(rename = "code", serialize_with = "serialize_kind")]
    pub kind: ExternalErrorKind,
    pub message: String,
    /// Offending fields, for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

fn serialize_kind<S: serde::Serializer>(
    kind: &ExternalErrorKind,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.code())
}

impl ExternalError {
    pub fn new(kind: ExternalErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ExternalErrorKind::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ExternalErrorKind::BadRequest, message)
    }

    /// Generic internal failure; details stay in the logs.
    pub fn internal() -> Self {
        Self::new(
            ExternalErrorKind::Internal,
            "Unexpected response from the host platform",
        )
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

impl From<ValidationError> for ExternalError {
    fn from(err: ValidationError) -> Self {
        Self {
            kind: ExternalErrorKind::BadRequest,
            message: err.rule,
            fields: Some(err.fields),
        }
    }
}

impl From<PermissionDenial> for ExternalError {
    fn from(denial: PermissionDenial) -> Self {
        let kind = match denial {
            PermissionDenial::FlagDisabled(_) => ExternalErrorKind::Forbidden,
            PermissionDenial::AdminRequired(_) => ExternalErrorKind::Unauthorized,
        };
        Self::new(kind, denial.to_string())
    }
}

impl From<UnknownDomain> for ExternalError {
    fn from(err: UnknownDomain) -> Self {
        Self::bad_request(err.to_string())
    }
}

/// Maps host outcomes into descriptors or [`ExternalError`]s.
pub struct ResponseTranslator;

impl ResponseTranslator {
    /// Translate a failed command. Internal failures are logged with full context.
    pub fn protocol_error(
        err: ProtocolError,
        domain: HelperDomain,
        action: HelperAction,
    ) -> ExternalError {
        match err {
            ProtocolError::Timeout(_) | ProtocolError::ConnectionLost => {
                warn!("{}/{} unavailable: {}", domain, action, err);
                ExternalError::new(ExternalErrorKind::ServiceUnavailable, err.to_string())
            }
            ProtocolError::Backend(backend) => Self::backend_error(backend, domain, action),
            ProtocolError::MalformedResponse(detail) => {
                error!("{}/{} malformed response: {}", domain, action, detail);
                ExternalError::internal()
            }
        }
    }

    fn backend_error(
        backend: BackendError,
        domain: HelperDomain,
        action: HelperAction,
    ) -> ExternalError {
        let kind = match backend.code.as_str() {
            "not_found" => ExternalErrorKind::NotFound,
            "duplicate_name" | "name_in_use" | "id_exists" => ExternalErrorKind::Conflict,
            "invalid_format" => ExternalErrorKind::BadRequest,
            _ => {
                error!(
                    "{}/{} failed with unmapped backend error {}",
                    domain, action, backend
                );
                return ExternalError::internal();
            }
        };
        ExternalError::new(kind, backend.message)
    }

    /// One descriptor from a create/update result.
    pub fn descriptor(
        domain: HelperDomain,
        action: HelperAction,
        result: &Value,
    ) -> Result<HelperDescriptor, ExternalError> {
        HelperDescriptor::from_host_item(domain, result).map_err(|e| {
            error!("{}/{} returned an unusable item: {} ({})", domain, action, e, result);
            ExternalError::internal()
        })
    }

    /// Every descriptor from a list result.
    pub fn descriptors(
        domain: HelperDomain,
        result: &Value,
    ) -> Result<Vec<HelperDescriptor>, ExternalError> {
        let items = result.as_array().ok_or_else(|| {
            error!("{}/list returned a non-array result: {}", domain, result);
            ExternalError::internal()
        })?;
        items
            .iter()
            .map(|item| Self::descriptor(domain, HelperAction::List, item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hacrud_domain::Operation;
    use serde_json::json;
    use std::time::Duration;

    // ==================== Taxonomy ====================

    #[test]
    fn validation_error_is_bad_request_with_fields() {
        let err: ExternalError = ValidationError::new(&["min", "max"], "min > max").into();
        assert_eq!(err.kind, ExternalErrorKind::BadRequest);
        assert_eq!(err.http_status(), 400);
        assert_eq!(
            err.fields,
            Some(vec!["min".to_string(), "max".to_string()])
        );
    }

    #[test]
    fn permission_denials_map_to_forbidden_and_unauthorized() {
        let flag: ExternalError = PermissionDenial::FlagDisabled(Operation::Create).into();
        assert_eq!(flag.http_status(), 403);
        let admin: ExternalError = PermissionDenial::AdminRequired(Operation::Create).into();
        assert_eq!(admin.http_status(), 401);
        assert_eq!(admin.message, "Admin permission required");
    }

    #[test]
    fn unavailable_is_service_unavailable() {
        for err in [
            ProtocolError::Timeout(Duration::from_secs(10)),
            ProtocolError::ConnectionLost,
        ] {
            let ext =
                ResponseTranslator::protocol_error(err, HelperDomain::Counter, HelperAction::List);
            assert_eq!(ext.kind, ExternalErrorKind::ServiceUnavailable);
            assert_eq!(ext.http_status(), 503);
        }
    }

    #[test]
    fn backend_codes() {
        let cases = [
            ("not_found", ExternalErrorKind::NotFound),
            ("duplicate_name", ExternalErrorKind::Conflict),
            ("name_in_use", ExternalErrorKind::Conflict),
            ("id_exists", ExternalErrorKind::Conflict),
            ("invalid_format", ExternalErrorKind::BadRequest),
            ("home_assistant_error", ExternalErrorKind::Internal),
        ];
        for (code, kind) in cases {
            let ext = ResponseTranslator::protocol_error(
                ProtocolError::Backend(BackendError::new(code, "boom")),
                HelperDomain::Timer,
                HelperAction::Create,
            );
            assert_eq!(ext.kind, kind, "{code}");
        }
    }

    #[test]
    fn internal_error_hides_backend_detail() {
        let ext = ResponseTranslator::protocol_error(
            ProtocolError::MalformedResponse("secret detail".into()),
            HelperDomain::Timer,
            HelperAction::Create,
        );
        assert_eq!(ext.kind, ExternalErrorKind::Internal);
        assert!(!ext.message.contains("secret"));
    }

    #[test]
    fn serializes_with_code_and_optional_fields() {
        let err = ExternalError::not_found("Helper counter.x not found");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"code": "not_found", "message": "Helper counter.x not found"})
        );
        let err: ExternalError = ValidationError::new(&["options"], "bad").into();
        assert_eq!(serde_json::to_value(&err).unwrap()["fields"], json!(["options"]));
    }

    // ==================== Descriptors ====================

    #[test]
    fn list_result_must_be_an_array() {
        let err = ResponseTranslator::descriptors(HelperDomain::Counter, &json!({})).unwrap_err();
        assert_eq!(err.kind, ExternalErrorKind::Internal);
        let items = ResponseTranslator::descriptors(
            HelperDomain::Counter,
            &json!([{"id": "a", "name": "A"}, {"id": "b", "name": "B"}]),
        )
        .unwrap();
        assert_eq!(items.len(), 2);
    }
}

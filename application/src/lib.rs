//! Application layer for hacrud
//!
//! This crate contains the CRUD use case, the host command port and the
//! external error taxonomy. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod translator;
pub mod use_cases;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-export commonly used types
pub use config::{CrudConfig, DEFAULT_COMMAND_TIMEOUT, PermissionFlags};
pub use ports::host_command::{DomainOutcome, HostCommandPort};
pub use translator::{ExternalError, ExternalErrorKind, ResponseTranslator};
pub use use_cases::crud_service::{CrudService, DomainFailure, HelperList};

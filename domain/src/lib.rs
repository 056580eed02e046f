//! Domain layer for hacrud
//!
//! Pure types and rules with no I/O: the helper domain registry, payload
//! validation, the permission gate and the host protocol message shapes.
//!
//! # Core Concepts
//!
//! - **Helper**: one configured instance of a [`HelperDomain`] on the host platform
//! - **DomainSchema**: immutable field rules and cross-field invariants per domain
//! - **PermissionGate**: feature-flag check, then admin check, for every operation

pub mod command;
pub mod helper;
pub mod permission;

pub use command::{BackendError, CommandEnvelope, HelperAction, ProtocolError, ResultEnvelope};
pub use helper::{
    DescriptorError, DomainSchema, HelperDescriptor, HelperDomain, HelperIdError, HelperRef,
    NormalizedPayload, UnknownDomain, ValidationEngine, ValidationError,
    ValidationMode, derive_object_id, schema_for, sort_descriptors,
};
pub use permission::{Operation, PermissionDenial, PermissionGate, PermissionProfile};

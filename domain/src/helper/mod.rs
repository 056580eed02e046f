//! Helper domains: registry, identifiers, validation and the external descriptor

pub mod descriptor;
pub mod id;
pub mod kind;
pub mod schema;
pub mod validation;

pub use descriptor::{DescriptorError, HelperDescriptor, sort_descriptors};
pub use id::{HelperIdError, HelperRef, derive_object_id, is_valid_object_id};
pub use kind::{HelperDomain, UnknownDomain};
pub use schema::{
    CrossFieldRule, DomainSchema, FieldRule, FieldType, RequiredField, schema_for,
};
pub use validation::{NormalizedPayload, ValidationEngine, ValidationError, ValidationMode};

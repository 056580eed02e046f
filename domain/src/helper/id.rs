//! Helper identifiers
//!
//! Externally a helper is addressed by an entity-style id, `{domain}.{object_id}`
//! (e.g. `input_number.living_room_target`). The domain prefix is what lets
//! get/update/delete route a call to the right domain without a scan.

use super::kind::HelperDomain;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Why a helper id string could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperIdError {
    #[error("Helper id cannot be empty")]
    Empty,

    #[error("Invalid helper id '{0}': expected '<domain>.<object_id>'")]
    MissingDomainPrefix(String),

    #[error("Helper id '{0}' does not belong to a helper domain")]
    UnknownDomain(String),
}

/// A resolved helper reference: domain plus the domain-local object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HelperRef {
    pub domain: HelperDomain,
    pub object_id: String,
}

impl HelperRef {
    pub fn new(domain: HelperDomain, object_id: impl Into<String>) -> Self {
        Self {
            domain,
            object_id: object_id.into(),
        }
    }

    /// The entity-style id, `{domain}.{object_id}`.
    pub fn entity_id(&self) -> String {
        format!("{}.{}", self.domain, self.object_id)
    }
}

impl std::fmt::Display for HelperRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}

impl FromStr for HelperRef {
    type Err = HelperIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(HelperIdError::Empty);
        }
        let (prefix, object_id) = s
            .split_once('.')
            .filter(|(_, object_id)| !object_id.is_empty())
            .ok_or_else(|| HelperIdError::MissingDomainPrefix(s.to_string()))?;
        let domain = prefix
            .parse::<HelperDomain>()
            .map_err(|_| HelperIdError::UnknownDomain(s.to_string()))?;
        Ok(Self::new(domain, object_id))
    }
}

/// Derive an object id from a display name.
///
/// Lowercases, turns spaces into underscores, drops anything that is not
/// alphanumeric or `_`, and prefixes `_` when the result starts with a digit.
/// Names with no usable characters get a random `helper_xxxxxxxx` id.
pub fn derive_object_id(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    match slug.chars().next() {
        None => {
            let random = uuid::Uuid::new_v4().simple().to_string();
            format!("helper_{}", &random[..8])
        }
        Some(c) if c.is_ascii_digit() => format!("_{slug}"),
        Some(_) => slug,
    }
}

/// Whether `s` is a valid object id (`[a-z_][a-z0-9_]*`).
pub fn is_valid_object_id(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

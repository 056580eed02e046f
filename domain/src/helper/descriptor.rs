//! External representation of one helper instance

use super::id::HelperRef;
use super::kind::HelperDomain;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A host item that could not be turned into a [`HelperDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("expected a JSON object for a {0} item")]
    NotAnObject(HelperDomain),

    #[error("{domain} item is missing string field `{field}`")]
    MissingField {
        domain: HelperDomain,
        field: &'static str,
    },
}

/// The normalized view of a helper returned to callers.
///
/// Serialized flat: `{"id": "counter.cups", "domain": "counter", "name": ..., "icon": ..., ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperDescriptor {
    /// Entity-style id, `{domain}.{object_id}`
    pub id: String,
    pub domain: HelperDomain,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Domain-specific fields (everything except id/name/icon)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl HelperDescriptor {
    /// Build a descriptor from one item as stored by the host.
    ///
    /// The host reports the domain-local object id under `id`.
    pub fn from_host_item(domain: HelperDomain, item: &Value) -> Result<Self, DescriptorError> {
        let obj = item
            .as_object()
            .ok_or(DescriptorError::NotAnObject(domain))?;
        let string_field = |field: &'static str| {
            obj.get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(DescriptorError::MissingField { domain, field })
        };

        let object_id = string_field("id")?;
        let name = string_field("name")?;
        let icon = obj.get("icon").and_then(Value::as_str).map(str::to_string);

        let fields = obj
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "id" | "name" | "icon" | "domain"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            id: HelperRef::new(domain, object_id).entity_id(),
            domain,
            name,
            icon,
            fields,
        })
    }

    /// The domain-local part of the id.
    pub fn object_id(&self) -> &str {
        self.id
            .split_once('.')
            .map(|(_, object_id)| object_id)
            .unwrap_or(&self.id)
    }

    /// Sort key for merged listings: domain, then case-insensitive name.
    pub fn sort_key(&self) -> (&'static str, String) {
        (self.domain.as_str(), self.name.to_lowercase())
    }
}

/// Order descriptors by domain, then by case-insensitive name.
pub fn sort_descriptors(items: &mut [HelperDescriptor]) {
    items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

//! CRUD service
//!
//! Every operation runs the same fixed pipeline:
//!
//! ```text
//! PermissionGate::authorize → ValidationEngine → HostCommandPort::execute → ResponseTranslator
//! ```
//!
//! Any stage that fails short-circuits the rest: a denied call never reaches
//! validation, and an invalid payload never reaches the host.

use crate::config::CrudConfig;
use crate::ports::host_command::HostCommandPort;
use crate::translator::{ExternalError, ResponseTranslator};
use hacrud_domain::{
    HelperAction, HelperDescriptor, HelperDomain, HelperRef, Operation,
    PermissionGate, PermissionProfile, ValidationEngine, ValidationError, derive_object_id,
    sort_descriptors,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A domain omitted from an unfiltered listing, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainFailure {
    pub domain: HelperDomain,
    pub error: ExternalError,
}

/// Result of a list call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelperList {
    pub helpers: Vec<HelperDescriptor>,
    /// Domains that could not be listed (unfiltered listings only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_domains: Vec<DomainFailure>,
}

impl HelperList {
    /// Whether every requested domain answered.
    pub fn is_complete(&self) -> bool {
        self.failed_domains.is_empty()
    }
}

/// Entry point shared by the REST and tool-call adapters.
pub struct CrudService {
    host: Arc<dyn HostCommandPort>,
    config: CrudConfig,
}

impl CrudService {
    pub fn new(host: Arc<dyn HostCommandPort>, config: CrudConfig) -> Self {
        Self { host, config }
    }

    pub fn config(&self) -> &CrudConfig {
        &self.config
    }

    /// The effective permission profile for a caller.
    pub fn profile_for(&self, is_admin: bool) -> PermissionProfile {
        self.config.profile_for(is_admin)
    }

    /// Run only the permission stage, for adapters that must reject a request
    /// before they can assemble its payload.
    pub fn authorize(
        &self,
        profile: &PermissionProfile,
        operation: Operation,
    ) -> Result<(), ExternalError> {
        Ok(PermissionGate::authorize(profile, operation)?)
    }

    /// List helpers in one domain, or in every domain when `domain` is `None`.
    pub async fn list(
        &self,
        profile: &PermissionProfile,
        domain: Option<&str>,
    ) -> Result<HelperList, ExternalError> {
        PermissionGate::authorize(profile, Operation::Read)?;

        match domain {
            Some(domain) => {
                let domain: HelperDomain = domain.parse()?;
                let mut helpers = self.list_domain(domain).await?;
                sort_descriptors(&mut helpers);
                Ok(HelperList {
                    helpers,
                    failed_domains: Vec::new(),
                })
            }
            None => Ok(self.list_all().await),
        }
    }

    /// Fetch one helper by its entity-style id.
    pub async fn get(
        &self,
        profile: &PermissionProfile,
        helper_id: &str,
    ) -> Result<HelperDescriptor, ExternalError> {
        PermissionGate::authorize(profile, Operation::Read)?;

        let helper: HelperRef = helper_id
            .parse()
            .map_err(|_| ExternalError::not_found(format!("Helper {helper_id} not found")))?;

        self.list_domain(helper.domain)
            .await?
            .into_iter()
            .find(|d| d.object_id() == helper.object_id)
            .ok_or_else(|| ExternalError::not_found(format!("Helper {helper_id} not found")))
    }

    pub async fn create(
        &self,
        profile: &PermissionProfile,
        domain: &str,
        fields: &Map<String, Value>,
    ) -> Result<HelperDescriptor, ExternalError> {
        PermissionGate::authorize(profile, Operation::Create)?;

        let domain: HelperDomain = domain.parse()?;
        let mut payload = ValidationEngine::validate_create(domain, fields)?;

        // object id: caller's slug, else derived from the name
        if !payload.contains_key("id")
            && let Some(name) = payload.get("name").and_then(Value::as_str)
        {
            let object_id = derive_object_id(name);
            payload.insert("id".into(), Value::String(object_id));
        }

        let result = self.send(domain, HelperAction::Create, payload).await?;
        let descriptor = ResponseTranslator::descriptor(domain, HelperAction::Create, &result)?;
        info!("Created helper {}", descriptor.id);
        Ok(descriptor)
    }

    pub async fn update(
        &self,
        profile: &PermissionProfile,
        helper_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<HelperDescriptor, ExternalError> {
        PermissionGate::authorize(profile, Operation::Update)?;

        let helper = parse_write_target(helper_id)?;
        let mut payload = ValidationEngine::validate_update(helper.domain, fields)?;
        payload.insert(
            helper.domain.id_key(),
            Value::String(helper.object_id.clone()),
        );

        let result = self.send(helper.domain, HelperAction::Update, payload).await?;
        let descriptor =
            ResponseTranslator::descriptor(helper.domain, HelperAction::Update, &result)?;
        info!("Updated helper {}", descriptor.id);
        Ok(descriptor)
    }

    /// Delete a helper, returning its id.
    pub async fn delete(
        &self,
        profile: &PermissionProfile,
        helper_id: &str,
    ) -> Result<String, ExternalError> {
        PermissionGate::authorize(profile, Operation::Delete)?;

        let helper = parse_write_target(helper_id)?;
        let mut payload = Map::new();
        payload.insert(
            helper.domain.id_key(),
            Value::String(helper.object_id.clone()),
        );

        self.send(helper.domain, HelperAction::Delete, payload).await?;
        info!("Deleted helper {}", helper);
        Ok(helper.entity_id())
    }

    // ==================== Internals ====================

    async fn send(
        &self,
        domain: HelperDomain,
        action: HelperAction,
        payload: Map<String, Value>,
    ) -> Result<Value, ExternalError> {
        debug!("Sending {}/{}", domain, action);
        self.host
            .execute(domain, action, payload, self.config.command_timeout)
            .await
            .and_then(|envelope| envelope.into_result())
            .map_err(|e| ResponseTranslator::protocol_error(e, domain, action))
    }

    async fn list_domain(
        &self,
        domain: HelperDomain,
    ) -> Result<Vec<HelperDescriptor>, ExternalError> {
        let result = self.send(domain, HelperAction::List, Map::new()).await?;
        ResponseTranslator::descriptors(domain, &result)
    }

    /// Best-effort merge: a failing domain is reported in `failed_domains`
    /// and omitted from `helpers`.
    async fn list_all(&self) -> HelperList {
        let outcomes = self
            .host
            .execute_all_domains(HelperAction::List, Map::new(), self.config.command_timeout)
            .await;

        let mut helpers = Vec::new();
        let mut failed_domains = Vec::new();

        for (domain, outcome) in outcomes {
            let listed = outcome
                .and_then(|envelope| envelope.into_result())
                .map_err(|e| ResponseTranslator::protocol_error(e, domain, HelperAction::List))
                .and_then(|result| ResponseTranslator::descriptors(domain, &result));
            match listed {
                Ok(items) => helpers.extend(items),
                Err(error) => {
                    warn!("Omitting {} from listing: {}", domain, error);
                    failed_domains.push(DomainFailure { domain, error });
                }
            }
        }

        sort_descriptors(&mut helpers);
        HelperList {
            helpers,
            failed_domains,
        }
    }
}

/// Resolve the target of an update/delete; a bad id is an input-shape error.
fn parse_write_target(helper_id: &str) -> Result<HelperRef, ExternalError> {
    helper_id
        .parse::<HelperRef>()
        .map_err(|e| ValidationError::new(&["id"], e.to_string()).into())
}

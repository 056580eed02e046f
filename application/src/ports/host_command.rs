//! Host command port
//!
//! The contract the CRUD service uses to reach the host platform. The
//! production adapter is the correlated single-connection orchestrator in the
//! infrastructure layer; tests substitute an in-memory host.

use async_trait::async_trait;
use futures::future::join_all;
use hacrud_domain::{HelperAction, HelperDomain, ProtocolError, ResultEnvelope};
use serde_json::{Map, Value};
use std::time::Duration;

/// Per-domain outcome of a fan-out over every helper domain.
pub type DomainOutcome = (HelperDomain, Result<ResultEnvelope, ProtocolError>);

/// Issues one `{domain}/{action}` command and waits for its response.
#[async_trait]
pub trait HostCommandPort: Send + Sync {
    /// Send a command and wait at most `timeout` for the matching response.
    ///
    /// Exactly one of: the response, [`ProtocolError::Timeout`], or
    /// [`ProtocolError::ConnectionLost`]. Backend-reported failures are returned
    /// as a `ResultEnvelope` with `success: false`.
    async fn execute(
        &self,
        domain: HelperDomain,
        action: HelperAction,
        payload: Map<String, Value>,
        timeout: Duration,
    ) -> Result<ResultEnvelope, ProtocolError>;

    /// Issue the same action against every domain concurrently.
    ///
    /// Default implementation joins one [`execute`](Self::execute) per domain.
    /// Outcomes are returned in [`HelperDomain::ALL`] order, one per domain.
    async fn execute_all_domains(
        &self,
        action: HelperAction,
        payload: Map<String, Value>,
        timeout: Duration,
    ) -> Vec<DomainOutcome> {
        let calls = HelperDomain::ALL.into_iter().map(|domain| {
            let payload = payload.clone();
            async move { (domain, self.execute(domain, action, payload, timeout).await) }
        });
        join_all(calls).await
    }
}

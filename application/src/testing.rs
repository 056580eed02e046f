//! In-memory host for tests
//!
//! Implements [`HostCommandPort`] against a process-local store that behaves
//! like the platform's helper storage: object ids derived from names, names
//! unique per domain, `not_found` for unknown ids.

use crate::ports::host_command::HostCommandPort;
use async_trait::async_trait;
use hacrud_domain::{
    BackendError, HelperAction, HelperDomain, ProtocolError, ResultEnvelope, derive_object_id,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Default)]
struct HostState {
    items: HashMap<HelperDomain, Vec<Map<String, Value>>>,
    failures: HashMap<HelperDomain, ProtocolError>,
    corrupt: HashMap<HelperDomain, Value>,
    commands: Vec<(HelperDomain, HelperAction)>,
}

/// Process-local stand-in for the host platform.
#[derive(Default)]
pub struct InMemoryHost {
    state: Mutex<HostState>,
    next_id: AtomicU64,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command to `domain` fails with `err` before touching the store.
    pub fn fail_domain(&self, domain: HelperDomain, err: ProtocolError) {
        self.lock().failures.insert(domain, err);
    }

    /// Every command to `domain` succeeds with `result` verbatim.
    pub fn corrupt_domain(&self, domain: HelperDomain, result: Value) {
        self.lock().corrupt.insert(domain, result);
    }

    /// Insert an item directly, bypassing validation.
    pub fn seed(&self, domain: HelperDomain, item: Value) {
        if let Value::Object(map) = item {
            self.lock().items.entry(domain).or_default().push(map);
        }
    }

    /// Commands received so far, in arrival order.
    pub fn commands(&self) -> Vec<(HelperDomain, HelperAction)> {
        self.lock().commands.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply(
        state: &mut HostState,
        domain: HelperDomain,
        action: HelperAction,
        mut payload: Map<String, Value>,
    ) -> Result<Value, BackendError> {
        let items = state.items.entry(domain).or_default();
        let id_key = domain.id_key();
        let position = |items: &[Map<String, Value>], object_id: &str| {
            items
                .iter()
                .position(|item| item.get("id").and_then(Value::as_str) == Some(object_id))
        };
        let name_taken = |items: &[Map<String, Value>], name: &str, except: Option<usize>| {
            items.iter().enumerate().any(|(i, item)| {
                Some(i) != except
                    && item
                        .get("name")
                        .and_then(Value::as_str)
                        .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
        };

        match action {
            HelperAction::List => Ok(Value::Array(
                items.iter().cloned().map(Value::Object).collect(),
            )),
            HelperAction::Create => {
                let name = payload
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                if name_taken(&items[..], &name, None) {
                    return Err(BackendError::new(
                        "duplicate_name",
                        format!("A {domain} named '{name}' already exists"),
                    ));
                }
                let object_id = match payload.remove("id") {
                    Some(Value::String(id)) => id,
                    _ => derive_object_id(&name),
                };
                if position(&items[..], &object_id).is_some() {
                    return Err(BackendError::new(
                        "id_exists",
                        format!("{domain}.{object_id} already exists"),
                    ));
                }
                let mut item = Map::new();
                item.insert("id".into(), Value::String(object_id));
                item.extend(payload);
                items.push(item.clone());
                Ok(Value::Object(item))
            }
            HelperAction::Update => {
                let object_id = payload
                    .remove(&id_key)
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                let index = position(&items[..], &object_id).ok_or_else(|| {
                    BackendError::new("not_found", format!("Unable to find {id_key} {object_id}"))
                })?;
                if let Some(name) = payload.get("name").and_then(Value::as_str)
                    && name_taken(&items[..], name, Some(index))
                {
                    return Err(BackendError::new(
                        "duplicate_name",
                        format!("A {domain} named '{name}' already exists"),
                    ));
                }
                items[index].extend(payload);
                Ok(Value::Object(items[index].clone()))
            }
            HelperAction::Delete => {
                let object_id = payload
                    .get(&id_key)
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let index = position(&items[..], object_id).ok_or_else(|| {
                    BackendError::new("not_found", format!("Unable to find {id_key} {object_id}"))
                })?;
                items.remove(index);
                Ok(Value::Null)
            }
        }
    }
}

#[async_trait]
impl HostCommandPort for InMemoryHost {
    async fn execute(
        &self,
        domain: HelperDomain,
        action: HelperAction,
        payload: Map<String, Value>,
        _timeout: Duration,
    ) -> Result<ResultEnvelope, ProtocolError> {
        // let concurrent callers interleave before the store is touched
        tokio::task::yield_now().await;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.lock();
        state.commands.push((domain, action));
        if let Some(err) = state.failures.get(&domain) {
            return Err(err.clone());
        }
        if let Some(result) = state.corrupt.get(&domain) {
            return Ok(ResultEnvelope::success(id, result.clone()));
        }
        Ok(match Self::apply(&mut state, domain, action, payload) {
            Ok(result) => ResultEnvelope::success(id, result),
            Err(error) => ResultEnvelope::failure(id, error),
        })
    }
}

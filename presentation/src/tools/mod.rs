//! Tool-call adapter
//!
//! Exposes the CRUD service as five named tools with JSON input schemas.
//! Failures are returned as the structured [`ExternalError`] value rather than
//! an HTTP status.

use hacrud_application::{CrudService, ExternalError};
use hacrud_domain::helper::{DomainSchema, FieldType, RequiredField};
use hacrud_domain::{HelperDomain, Operation, PermissionProfile};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

pub const LIST_HELPERS: &str = "list_helpers";
pub const GET_HELPER: &str = "get_helper";
pub const CREATE_HELPER: &str = "create_helper";
pub const UPDATE_HELPER: &str = "update_helper";
pub const DELETE_HELPER: &str = "delete_helper";

/// Name, description and input schema of one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// The permission stage each tool runs through.
fn operation_for(tool: &str) -> Option<Operation> {
    match tool {
        LIST_HELPERS | GET_HELPER => Some(Operation::Read),
        CREATE_HELPER => Some(Operation::Create),
        UPDATE_HELPER => Some(Operation::Update),
        DELETE_HELPER => Some(Operation::Delete),
        _ => None,
    }
}

/// Dispatches tool calls to a shared [`CrudService`].
pub struct HelperToolset {
    service: Arc<CrudService>,
}

impl HelperToolset {
    pub fn new(service: Arc<CrudService>) -> Self {
        Self { service }
    }

    /// All tool definitions, sorted by name.
    pub fn definitions() -> Vec<ToolDefinition> {
        let helper_id = json!({
            "type": "string",
            "description": "Helper id in `{domain}.{object_id}` form, e.g. `counter.cups`",
        });
        let domain = json!({
            "type": "string",
            "enum": HelperDomain::ALL.iter().map(HelperDomain::as_str).collect::<Vec<_>>(),
            "description": "Helper domain",
        });

        let mut create_properties = field_properties();
        create_properties.insert("domain".to_string(), domain.clone());
        create_properties.insert(
            "id".to_string(),
            json!({
                "type": "string",
                "description": "Lowercase object id; derived from `name` when omitted",
            }),
        );
        let mut update_properties = field_properties();
        update_properties.insert("helper_id".to_string(), helper_id.clone());

        let mut tools = vec![
            ToolDefinition {
                name: LIST_HELPERS,
                description: "List configured helpers, optionally in a single domain",
                input_schema: object_schema(
                    [("domain".to_string(), domain)].into_iter().collect(),
                    &[],
                ),
            },
            ToolDefinition {
                name: GET_HELPER,
                description: "Fetch one helper by id",
                input_schema: object_schema(
                    [("helper_id".to_string(), helper_id.clone())]
                        .into_iter()
                        .collect(),
                    &["helper_id"],
                ),
            },
            ToolDefinition {
                name: CREATE_HELPER,
                description: "Create a helper. Required fields depend on the domain: \
                              input_number needs min and max, input_select needs options, \
                              input_datetime needs has_date or has_time",
                input_schema: object_schema(create_properties, &["domain", "name"]),
            },
            ToolDefinition {
                name: UPDATE_HELPER,
                description: "Update fields of an existing helper",
                input_schema: object_schema(update_properties, &["helper_id"]),
            },
            ToolDefinition {
                name: DELETE_HELPER,
                description: "Delete a helper by id",
                input_schema: object_schema(
                    [("helper_id".to_string(), helper_id)].into_iter().collect(),
                    &["helper_id"],
                ),
            },
        ];
        tools.sort_by_key(|t| t.name);
        tools
    }

    /// Invoke a tool with a JSON object of arguments.
    pub async fn call(
        &self,
        name: &str,
        args: &Value,
        profile: &PermissionProfile,
    ) -> Result<Value, ExternalError> {
        let operation =
            operation_for(name).ok_or_else(|| ExternalError::bad_request(format!("Unknown tool: {name}")))?;
        self.service.authorize(profile, operation)?;
        debug!("Tool call {} with {}", name, args);

        let mut args = match args {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => return Err(ExternalError::bad_request("Tool arguments must be a JSON object")),
        };

        match name {
            LIST_HELPERS => {
                let domain = optional_str(&args, "domain")?;
                let list = self.service.list(profile, domain.as_deref()).await?;
                to_json(&list)
            }
            GET_HELPER => {
                let id = take_str(&mut args, "helper_id")?;
                to_json(&self.service.get(profile, &id).await?)
            }
            CREATE_HELPER => {
                let domain = take_str(&mut args, "domain")?;
                to_json(&self.service.create(profile, &domain, &args).await?)
            }
            UPDATE_HELPER => {
                let id = take_str(&mut args, "helper_id")?;
                to_json(&self.service.update(profile, &id, &args).await?)
            }
            _ => {
                let id = take_str(&mut args, "helper_id")?;
                let deleted = self.service.delete(profile, &id).await?;
                Ok(json!({ "deleted": deleted }))
            }
        }
    }
}

fn object_schema(properties: Map<String, Value>, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Union of every domain's field rules as JSON Schema properties.
///
/// Integer and number widen to `number`; any other disagreement between
/// domains becomes a type union. Each property lists the domains that accept it.
fn field_properties() -> Map<String, Value> {
    let mut merged: BTreeMap<&'static str, (BTreeSet<&'static str>, Vec<&'static str>)> =
        BTreeMap::new();
    for domain in HelperDomain::ALL {
        let schema = DomainSchema::of(domain);
        let names = schema.field_rules.iter().map(|r| (r.name, json_type(r.kind)));
        let any_of = schema.required_create_fields.iter().flat_map(|f| match f {
            RequiredField::AnyOf(fields) => fields.to_vec(),
            RequiredField::Field(_) => Vec::new(),
        });
        for (name, ty) in names.chain(any_of.map(|n| (n, "boolean"))) {
            let entry = merged.entry(name).or_default();
            entry.0.insert(ty);
            if !entry.1.contains(&domain.as_str()) {
                entry.1.push(domain.as_str());
            }
        }
    }

    merged
        .into_iter()
        .map(|(name, (mut types, domains))| {
            if types.contains("number") {
                types.remove("integer");
            }
            let mut prop = Map::new();
            match types.len() {
                1 => prop.insert("type".to_string(), json!(types.first())),
                _ => prop.insert("type".to_string(), json!(types)),
            };
            if types.contains("array") {
                prop.insert("items".to_string(), json!({"type": "string"}));
            }
            prop.insert(
                "description".to_string(),
                json!(format!("Accepted by: {}", domains.join(", "))),
            );
            (name.to_string(), Value::Object(prop))
        })
        .collect()
}

fn json_type(kind: FieldType) -> &'static str {
    match kind {
        FieldType::Boolean => "boolean",
        FieldType::Number => "number",
        FieldType::Integer { .. } => "integer",
        FieldType::Options => "array",
        FieldType::Text
        | FieldType::Choice(_)
        | FieldType::Pattern
        | FieldType::Duration
        | FieldType::Slug => "string",
    }
}

fn missing(field: &str) -> ExternalError {
    let mut err = ExternalError::bad_request(format!("Missing required field: {field}"));
    err.fields = Some(vec![field.to_string()]);
    err
}

fn take_str(args: &mut Map<String, Value>, field: &str) -> Result<String, ExternalError> {
    match args.remove(field) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(missing(field)),
    }
}

fn optional_str(args: &Map<String, Value>, field: &str) -> Result<Option<String>, ExternalError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => {
            let mut err = ExternalError::bad_request(format!("`{field}` must be a string"));
            err.fields = Some(vec![field.to_string()]);
            Err(err)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ExternalError> {
    serde_json::to_value(value).map_err(|_| ExternalError::internal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hacrud_application::testing::InMemoryHost;
    use hacrud_application::{CrudConfig, ExternalErrorKind, PermissionFlags};
    use hacrud_domain::ProtocolError;
    use std::time::Duration;

    fn toolset(flags: PermissionFlags) -> (Arc<InMemoryHost>, HelperToolset) {
        let host = Arc::new(InMemoryHost::new());
        let service = CrudService::new(host.clone(), CrudConfig::default().with_permissions(flags));
        (host, HelperToolset::new(Arc::new(service)))
    }

    fn admin() -> PermissionProfile {
        PermissionProfile::full_admin()
    }

    #[test]
    fn definitions_are_sorted_and_typed() {
        let tools = HelperToolset::definitions();
        let names: Vec<_> = tools.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![CREATE_HELPER, DELETE_HELPER, GET_HELPER, LIST_HELPERS, UPDATE_HELPER]
        );

        let create = &tools[0].input_schema;
        assert_eq!(create["required"], json!(["domain", "name"]));
        assert_eq!(create["properties"]["id"]["type"], "string");
        assert_eq!(create["properties"]["options"]["type"], "array");
        assert_eq!(create["properties"]["has_date"]["type"], "boolean");
        assert_eq!(create["properties"]["restore"]["type"], "boolean");
        // integer in input_text, number in input_number
        assert_eq!(create["properties"]["min"]["type"], "number");
        assert_eq!(create["properties"]["domain"]["enum"].as_array().unwrap().len(), 7);
        // only counter's integer and input_number's number disagree
        assert_eq!(create["properties"]["step"]["type"], "number");
        assert_eq!(create["properties"]["minimum"]["type"], "integer");

        let update = &tools[4].input_schema;
        assert!(update["properties"].get("id").is_none());
        assert_eq!(update["required"], json!(["helper_id"]));
    }

    #[test]
    fn mixed_field_types_become_a_union() {
        let tools = HelperToolset::definitions();
        let create = &tools[0].input_schema;
        assert_eq!(
            create["properties"]["initial"]["type"],
            json!(["boolean", "number", "string"])
        );
        assert_eq!(
            create["properties"]["initial"]["description"],
            "Accepted by: input_boolean, input_number, input_text, input_select, counter"
        );
    }

    #[tokio::test]
    async fn create_get_update_delete_roundtrip() {
        let (_, tools) = toolset(PermissionFlags::all());
        let created = tools
            .call(CREATE_HELPER, &json!({"domain": "counter", "name": "Cups", "step": 2}), &admin())
            .await
            .unwrap();
        assert_eq!(created["id"], "counter.cups");

        let fetched = tools
            .call(GET_HELPER, &json!({"helper_id": "counter.cups"}), &admin())
            .await
            .unwrap();
        assert_eq!(fetched["step"], 2);

        let updated = tools
            .call(UPDATE_HELPER, &json!({"helper_id": "counter.cups", "step": 5}), &admin())
            .await
            .unwrap();
        assert_eq!(updated["step"], 5);

        let deleted = tools
            .call(DELETE_HELPER, &json!({"helper_id": "counter.cups"}), &admin())
            .await
            .unwrap();
        assert_eq!(deleted, json!({"deleted": "counter.cups"}));

        let err = tools
            .call(GET_HELPER, &json!({"helper_id": "counter.cups"}), &admin())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ExternalErrorKind::NotFound);
    }

    #[tokio::test]
    async fn list_reports_failed_domains() {
        let (host, tools) = toolset(PermissionFlags::all());
        host.seed(HelperDomain::InputBoolean, json!({"id": "guest", "name": "Guest"}));
        host.fail_domain(HelperDomain::Timer, ProtocolError::Timeout(Duration::from_secs(10)));

        let listed = tools.call(LIST_HELPERS, &Value::Null, &admin()).await.unwrap();
        assert_eq!(listed["helpers"][0]["id"], "input_boolean.guest");
        assert_eq!(listed["failed_domains"][0]["domain"], "timer");
        assert_eq!(listed["failed_domains"][0]["error"]["code"], "service_unavailable");

        let filtered = tools
            .call(LIST_HELPERS, &json!({"domain": "input_boolean"}), &admin())
            .await
            .unwrap();
        assert!(filtered.get("failed_domains").is_none());
    }

    #[tokio::test]
    async fn permission_is_checked_before_arguments() {
        let (_, tools) = toolset(PermissionFlags::default());
        let read_only_admin = CrudConfig::default().profile_for(true);
        let err = tools
            .call(CREATE_HELPER, &json!("garbage"), &read_only_admin)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ExternalErrorKind::Forbidden);

        let (_, tools) = toolset(PermissionFlags::all());
        let err = tools
            .call(DELETE_HELPER, &json!({"helper_id": "counter.x"}), &PermissionProfile::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ExternalErrorKind::Forbidden);

        let reader = CrudConfig::default()
            .with_permissions(PermissionFlags::all())
            .profile_for(false);
        let err = tools
            .call(DELETE_HELPER, &json!({"helper_id": "counter.x"}), &reader)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ExternalErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn argument_errors_name_the_field() {
        let (_, tools) = toolset(PermissionFlags::all());
        let err = tools.call(GET_HELPER, &json!({}), &admin()).await.unwrap_err();
        assert_eq!(err.fields, Some(vec!["helper_id".to_string()]));

        let err = tools
            .call(CREATE_HELPER, &json!({"name": "x"}), &admin())
            .await
            .unwrap_err();
        assert_eq!(err.fields, Some(vec!["domain".to_string()]));

        let err = tools
            .call(LIST_HELPERS, &json!({"domain": 3}), &admin())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ExternalErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn unknown_tool_is_bad_request() {
        let (_, tools) = toolset(PermissionFlags::all());
        let err = tools.call("drop_tables", &json!({}), &admin()).await.unwrap_err();
        assert_eq!(err.kind, ExternalErrorKind::BadRequest);
        assert_eq!(err.message, "Unknown tool: drop_tables");
    }
}

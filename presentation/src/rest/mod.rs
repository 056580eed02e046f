//! REST adapter
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | GET | `/helpers[?domain=X]` | 200, array of descriptors |
//! | GET | `/helpers/{id}` | 200, descriptor |
//! | POST | `/helpers` | 201, descriptor |
//! | PATCH | `/helpers/{id}` | 200, descriptor |
//! | DELETE | `/helpers/{id}` | 204 |
//!
//! Every request needs `Authorization: Bearer <token>`. An unfiltered listing
//! that had to omit domains names them in the `x-failed-domains` header.

pub mod auth;
pub mod error;

pub use auth::{Caller, CallerResolver, StaticTokenResolver, bearer_token};
pub use error::ApiError;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use hacrud_application::{CrudService, ExternalError};
use hacrud_domain::{Operation, PermissionProfile};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Response header listing domains omitted from an unfiltered listing.
pub const FAILED_DOMAINS_HEADER: &str = "x-failed-domains";

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CrudService>,
    pub callers: Arc<dyn CallerResolver>,
}

impl AppState {
    pub fn new(service: Arc<CrudService>, callers: Arc<dyn CallerResolver>) -> Self {
        Self { service, callers }
    }

    /// Resolve the bearer token into this call's permission profile.
    async fn profile(&self, headers: &HeaderMap) -> Result<PermissionProfile, ApiError> {
        let token = bearer_token(headers).ok_or_else(ApiError::unauthenticated)?;
        let caller = self
            .callers
            .resolve(token)
            .await
            .ok_or_else(ApiError::unauthenticated)?;
        Ok(self.service.profile_for(caller.is_admin))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/helpers", get(list_helpers).post(create_helper))
        .route(
            "/helpers/{id}",
            get(get_helper).patch(update_helper).delete(delete_helper),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub domain: Option<String>,
}

async fn list_helpers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let profile = state.profile(&headers).await?;
    let list = state
        .service
        .list(&profile, query.domain.as_deref())
        .await?;

    let mut response_headers = HeaderMap::new();
    if !list.is_complete() {
        let failed = list
            .failed_domains
            .iter()
            .map(|f| f.domain.as_str())
            .collect::<Vec<_>>()
            .join(",");
        if let Ok(value) = HeaderValue::from_str(&failed) {
            response_headers.insert(HeaderName::from_static(FAILED_DOMAINS_HEADER), value);
        }
    }
    Ok((response_headers, Json(list.helpers)).into_response())
}

async fn get_helper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let profile = state.profile(&headers).await?;
    let helper = state.service.get(&profile, &id).await?;
    Ok(Json(helper).into_response())
}

async fn create_helper(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let profile = state.profile(&headers).await?;
    let mut fields = json_object(&state, &profile, Operation::Create, body)?;

    let domain = match fields.remove("domain") {
        Some(Value::String(domain)) => domain,
        _ => {
            let mut err = ExternalError::bad_request("Missing required field: domain");
            err.fields = Some(vec!["domain".to_string()]);
            return Err(err.into());
        }
    };

    let helper = state.service.create(&profile, &domain, &fields).await?;
    Ok((StatusCode::CREATED, Json(helper)).into_response())
}

async fn update_helper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let profile = state.profile(&headers).await?;
    let fields = json_object(&state, &profile, Operation::Update, body)?;
    let helper = state.service.update(&profile, &id, &fields).await?;
    Ok(Json(helper).into_response())
}

async fn delete_helper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let profile = state.profile(&headers).await?;
    state.service.delete(&profile, &id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Run the permission stage, then unwrap a JSON object body. A denial always
/// takes precedence over anything wrong with the body.
fn json_object(
    state: &AppState,
    profile: &PermissionProfile,
    operation: Operation,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Map<String, Value>, ApiError> {
    state.service.authorize(profile, operation)?;
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(_) => Err(ExternalError::bad_request("Request body must be a JSON object").into()),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection);
            Err(ExternalError::bad_request("Invalid JSON in request body").into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use hacrud_application::testing::InMemoryHost;
    use hacrud_application::{CrudConfig, PermissionFlags};
    use hacrud_domain::{HelperDomain, ProtocolError};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    const ADMIN: &str = "admin-token";
    const READER: &str = "reader-token";

    fn app_with(flags: PermissionFlags) -> (Arc<InMemoryHost>, Router) {
        let host = Arc::new(InMemoryHost::new());
        let service = Arc::new(CrudService::new(
            host.clone(),
            CrudConfig::default().with_permissions(flags),
        ));
        let callers = StaticTokenResolver::default()
            .with_token(ADMIN, true)
            .with_token(READER, false);
        (host, router(AppState::new(service, Arc::new(callers))))
    }

    fn app() -> (Arc<InMemoryHost>, Router) {
        app_with(PermissionFlags::all())
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    // ==================== Authentication ====================

    #[tokio::test]
    async fn missing_or_unknown_token_is_401() {
        let (_, app) = app();
        let (status, _, body) = send(&app, request("GET", "/helpers", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthorized");

        let (status, _, _) = send(&app, request("GET", "/helpers", Some("nope"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_admin_write_is_401_and_disabled_flag_is_403() {
        let (_, app) = app();
        let body = json!({"domain": "input_boolean", "name": "Guest"});
        let (status, _, body_json) =
            send(&app, request("POST", "/helpers", Some(READER), Some(body.clone()))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body_json["message"], "Admin permission required");

        let (_, locked) = app_with(PermissionFlags::default());
        let (status, _, body_json) =
            send(&locked, request("POST", "/helpers", Some(ADMIN), Some(body))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body_json["message"], "Helper create permission is disabled");
    }

    #[tokio::test]
    async fn invalid_json_is_400_only_after_permission_checks() {
        let (_, locked) = app_with(PermissionFlags::default());
        let req = Request::builder()
            .method("POST")
            .uri("/helpers")
            .header(header::AUTHORIZATION, format!("Bearer {ADMIN}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, _) = send(&locked, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, app) = app();
        let req = Request::builder()
            .method("POST")
            .uri("/helpers")
            .header(header::AUTHORIZATION, format!("Bearer {ADMIN}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid JSON in request body");
    }

    // ==================== CRUD flow ====================

    #[tokio::test]
    async fn numeric_helper_lifecycle() {
        let (_, app) = app();
        let (status, _, created) = send(
            &app,
            request(
                "POST",
                "/helpers",
                Some(ADMIN),
                Some(json!({"domain": "input_number", "name": "Test", "min": 0, "max": 100, "step": 1})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], "input_number.test");
        assert_eq!(created["min"], 0);
        assert_eq!(created["max"], 100);
        assert_eq!(created["step"], 1);

        let (status, _, updated) = send(
            &app,
            request(
                "PATCH",
                "/helpers/input_number.test",
                Some(ADMIN),
                Some(json!({"min": 0, "max": 0})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["max"], 0);

        let (status, _, err) = send(
            &app,
            request(
                "POST",
                "/helpers",
                Some(ADMIN),
                Some(json!({"domain": "input_number", "name": "Bad", "min": 100, "max": 0})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["fields"], json!(["min", "max"]));

        let (status, _, fetched) =
            send(&app, request("GET", "/helpers/input_number.test", Some(READER), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Test");

        let (status, _, body) = send(
            &app,
            request("DELETE", "/helpers/input_number.test", Some(ADMIN), None),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _, _) = send(
            &app,
            request("DELETE", "/helpers/input_number.test", Some(ADMIN), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_create_is_409() {
        let (_, app) = app();
        let body = json!({"domain": "counter", "name": "Cups"});
        let (status, _, _) =
            send(&app, request("POST", "/helpers", Some(ADMIN), Some(body.clone()))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _, err) = send(&app, request("POST", "/helpers", Some(ADMIN), Some(body))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "conflict");
    }

    #[tokio::test]
    async fn missing_domain_in_body_is_400() {
        let (_, app) = app();
        let (status, _, err) = send(
            &app,
            request("POST", "/helpers", Some(ADMIN), Some(json!({"name": "x"}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["fields"], json!(["domain"]));
    }

    #[tokio::test]
    async fn missing_domain_is_denied_before_body_checks() {
        let body = json!({"name": "x"});
        let (_, locked) = app_with(PermissionFlags::default());
        let (status, _, err) =
            send(&locked, request("POST", "/helpers", Some(ADMIN), Some(body.clone()))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(err.get("fields").is_none());

        let (_, open) = app();
        let (status, _, err) =
            send(&open, request("POST", "/helpers", Some(READER), Some(body))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["message"], "Admin permission required");

        let (status, _, _) = send(
            &open,
            request("PATCH", "/helpers/counter.x", Some(READER), Some(json!([1]))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_helper_is_404() {
        let (_, app) = app();
        let (status, _, _) =
            send(&app, request("GET", "/helpers/counter.nope", Some(READER), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ==================== Listing ====================

    #[tokio::test]
    async fn list_with_invalid_domain_is_400() {
        let (_, app) = app();
        let (status, _, err) = send(
            &app,
            request("GET", "/helpers?domain=input_invalid", Some(READER), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["message"].as_str().unwrap().contains("Valid domains"));
    }

    #[tokio::test]
    async fn list_filters_and_reports_failed_domains() {
        let (host, app) = app();
        host.seed(HelperDomain::Counter, json!({"id": "a", "name": "A"}));
        host.seed(HelperDomain::Timer, json!({"id": "t", "name": "T"}));

        let (status, _, body) =
            send(&app, request("GET", "/helpers?domain=timer", Some(READER), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"id": "timer.t", "domain": "timer", "name": "T"}]));

        host.fail_domain(HelperDomain::Timer, ProtocolError::ConnectionLost);
        let (status, headers, body) =
            send(&app, request("GET", "/helpers", Some(READER), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(headers[FAILED_DOMAINS_HEADER], "timer");
    }

    #[tokio::test]
    async fn read_disabled_is_403() {
        let (_, app) = app_with(PermissionFlags {
            read: false,
            ..PermissionFlags::all()
        });
        let (status, _, body) = send(&app, request("GET", "/helpers", Some(ADMIN), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Helper read permission is disabled");
    }
}

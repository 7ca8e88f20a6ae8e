//! HTTP routes.
//!
//! - public: health, public key, device enrollment, password login
//! - `/internal/*`: trusted callers only (gateway checks, key provisioning,
//!   challenge signing, user token reissue); expose on a private network
//! - everything else requires a bearer, see [`require_auth`]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router, middleware};
use portcullis_auth::api::{
    ApiTokenAuthResponse, ChallengeRequest, ChallengeResponse, DeviceKeyResponse, EnrollRequest,
    EnrollResponse, LoginRequest, PublicKeyRequest, UserAuthResponse,
};
use portcullis_auth::{AuthError, RequestContext};
use portcullis_core::{
    Device, DeviceStatus, Fingerprint, Namespace, NamespaceToken, PublicKeyRecord,
    PublicKeyUpdate, Session,
};
use portcullis_token::Principal;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::middleware::auth::extract_bearer;
use crate::middleware::require_auth;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/auth/user", get(whoami))
        .route("/api/auth/token/{tenant}", get(swap_namespace))
        .route("/api/namespaces/{name}/members", post(add_member))
        .route(
            "/api/namespaces/{name}/members/{username}",
            delete(remove_member),
        )
        .route(
            "/api/namespaces/{name}/token",
            post(create_api_token)
                .get(get_api_token)
                .delete(delete_api_token)
                .patch(change_api_token_permission),
        )
        .route("/api/namespaces/{name}/token/bearer", post(issue_api_bearer))
        .route("/api/devices", get(list_devices))
        .route("/api/devices/{uid}", get(get_device))
        .route("/api/devices/{uid}/status", patch(update_device_status))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/{uid}", get(get_session))
        .route(
            "/api/public-keys",
            get(list_public_keys).post(create_public_key),
        )
        .route(
            "/api/public-keys/{fingerprint}",
            get(get_public_key)
                .patch(update_public_key)
                .delete(delete_public_key),
        )
        .route("/api/admin/devices", get(admin_list_devices))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/auth/public-key", get(public_key))
        .route("/api/devices/auth", post(enroll))
        .route("/api/login", post(login))
        .route("/internal/auth", get(internal_auth))
        .route("/internal/users/{id}/token", get(reissue_user_token))
        .route("/internal/keys", post(create_device_key))
        .route("/internal/challenge", post(sign_challenge))
        .route(
            "/internal/public-keys/{fingerprint}/{tenant}",
            get(lookup_public_key),
        )
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn public_key(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "public_key": state.auth.public_key_hex() }))
}

async fn enroll(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EnrollRequest>,
) -> ApiResult<EnrollResponse> {
    Ok(Json(state.auth.enroll(req).await?))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<UserAuthResponse> {
    Ok(Json(state.auth.login(req).await?))
}

/// Gateway check: verify the bearer and describe it in response headers.
async fn internal_auth(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let bearer = extract_bearer(&headers)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::unauthorized("missing bearer token"))?;
    let ctx = state.auth.authenticate(bearer).await?;

    let mut response = StatusCode::OK.into_response();
    let out = response.headers_mut();
    set_header(out, "x-tenant-id", ctx.scope().tenant_id().unwrap_or_default())?;
    match ctx.principal() {
        Principal::Device(device) => {
            set_header(out, "x-device-uid", device.fingerprint.as_str())?;
        }
        Principal::User(user) => {
            set_header(out, "x-id", &user.id)?;
            set_header(out, "x-username", &user.username)?;
        }
        Principal::Token(token) => {
            set_header(out, "x-id", &token.id)?;
        }
    }
    set_header(out, "x-read-only", if ctx.is_read_only() { "true" } else { "false" })?;
    Ok(response)
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), ApiError> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| AuthError::validation(format!("{name} is not a valid header value")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

async fn reissue_user_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<UserAuthResponse> {
    Ok(Json(state.auth.get_token(&id).await?))
}

async fn create_device_key(State(state): State<Arc<AppState>>) -> ApiResult<DeviceKeyResponse> {
    Ok(Json(state.auth.create_device_key().await?))
}

async fn sign_challenge(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChallengeRequest>,
) -> ApiResult<ChallengeResponse> {
    let signature = state
        .auth
        .respond_to_challenge(&req.fingerprint, req.data.as_bytes())
        .await?;
    Ok(Json(ChallengeResponse { signature }))
}

/// Gateway lookup of a registered public key in a known tenant.
async fn lookup_public_key(
    State(state): State<Arc<AppState>>,
    Path((fingerprint, tenant)): Path<(String, String)>,
) -> ApiResult<PublicKeyRecord> {
    Ok(Json(
        state.directory.lookup_public_key(&fingerprint, &tenant).await?,
    ))
}

async fn whoami(Extension(ctx): Extension<RequestContext>) -> Json<Value> {
    Json(json!({
        "principal": ctx.principal(),
        "tenant": ctx.scope().tenant_id(),
        "read_only": ctx.is_read_only(),
    }))
}

async fn swap_namespace(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(tenant): Path<String>,
) -> ApiResult<UserAuthResponse> {
    let user = ctx.require_user()?;
    Ok(Json(state.auth.swap_namespace(&user.username, &tenant).await?))
}

#[derive(Debug, Deserialize)]
struct MemberRequest {
    username: String,
}

async fn add_member(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(name): Path<String>,
    Json(req): Json<MemberRequest>,
) -> ApiResult<Namespace> {
    Ok(Json(
        state.directory.add_member(&ctx, &name, &req.username).await?,
    ))
}

async fn remove_member(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path((name, username)): Path<(String, String)>,
) -> ApiResult<Namespace> {
    Ok(Json(
        state.directory.remove_member(&ctx, &name, &username).await?,
    ))
}

async fn create_api_token(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(name): Path<String>,
) -> ApiResult<NamespaceToken> {
    state.lifecycle.authorize(&ctx, &name).await?;
    Ok(Json(state.lifecycle.create_token(&name).await?))
}

async fn get_api_token(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(name): Path<String>,
) -> ApiResult<NamespaceToken> {
    state.lifecycle.authorize(&ctx, &name).await?;
    Ok(Json(state.lifecycle.get_token(&name).await?))
}

async fn delete_api_token(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.lifecycle.authorize(&ctx, &name).await?;
    state.lifecycle.delete_token(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_api_token_permission(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(name): Path<String>,
) -> ApiResult<NamespaceToken> {
    state.lifecycle.authorize(&ctx, &name).await?;
    Ok(Json(state.lifecycle.change_permission(&name).await?))
}

async fn issue_api_bearer(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(name): Path<String>,
) -> ApiResult<ApiTokenAuthResponse> {
    state.lifecycle.authorize(&ctx, &name).await?;
    Ok(Json(state.auth.auth_api_token(&name).await?))
}

async fn list_devices(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Vec<Device>> {
    Ok(Json(state.directory.list_devices(&ctx).await?))
}

fn parse_uid(uid: &str) -> Result<Fingerprint, ApiError> {
    Fingerprint::parse(uid).ok_or_else(|| {
        ApiError(AuthError::NotFound {
            entity: "device",
            key: uid.to_string(),
        })
    })
}

async fn get_device(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(uid): Path<String>,
) -> ApiResult<Device> {
    let uid = parse_uid(&uid)?;
    Ok(Json(state.directory.get_device(&ctx, &uid).await?))
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: DeviceStatus,
}

async fn update_device_status(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(uid): Path<String>,
    Json(req): Json<StatusUpdate>,
) -> ApiResult<Device> {
    let uid = parse_uid(&uid)?;
    Ok(Json(
        state
            .directory
            .update_device_status(&ctx, &uid, req.status)
            .await?,
    ))
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Vec<Session>> {
    Ok(Json(state.directory.list_sessions(&ctx).await?))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(uid): Path<String>,
) -> ApiResult<Session> {
    Ok(Json(state.directory.get_session(&ctx, &uid).await?))
}

async fn list_public_keys(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Vec<PublicKeyRecord>> {
    Ok(Json(state.directory.list_public_keys(&ctx).await?))
}

async fn create_public_key(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<PublicKeyRequest>,
) -> ApiResult<PublicKeyRecord> {
    Ok(Json(state.directory.create_public_key(&ctx, req).await?))
}

async fn get_public_key(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(fingerprint): Path<String>,
) -> ApiResult<PublicKeyRecord> {
    Ok(Json(
        state.directory.get_public_key(&ctx, &fingerprint).await?,
    ))
}

async fn update_public_key(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(fingerprint): Path<String>,
    Json(update): Json<PublicKeyUpdate>,
) -> ApiResult<PublicKeyRecord> {
    Ok(Json(
        state
            .directory
            .update_public_key(&ctx, &fingerprint, update)
            .await?,
    ))
}

async fn delete_public_key(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(fingerprint): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.directory.delete_public_key(&ctx, &fingerprint).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct AdminQuery {
    #[serde(default)]
    reason: String,
}

/// Devices across every tenant. Requires an admin user and a reason.
async fn admin_list_devices(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<AdminQuery>,
) -> ApiResult<Vec<Device>> {
    let ctx = state.auth.administrative(&ctx, &query.reason).await?;
    Ok(Json(state.directory.list_devices(&ctx).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use portcullis_audit::AuditLogger;
    use portcullis_auth::{IssuancePolicy, password};
    use portcullis_core::User;
    use portcullis_store::{MemoryStore, Store};
    use portcullis_token::KeyPair;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn app() -> Router {
        let store = Arc::new(MemoryStore::new());
        for (id, username, pass) in [("u-alice", "alice", "alicepass"), ("u-bob", "bob", "bobpass")] {
            store
                .create_user(User {
                    id: id.into(),
                    name: username.to_uppercase(),
                    username: username.into(),
                    email: format!("{username}@example.com"),
                    password_digest: password::digest(pass),
                })
                .await
                .unwrap();
        }
        store
            .create_namespace(Namespace::new("acme", "u-alice", "t1"))
            .await
            .unwrap();
        store
            .create_namespace(Namespace::new("globex", "u-bob", "t2"))
            .await
            .unwrap();

        let state = AppState::build(
            store,
            KeyPair::generate().unwrap(),
            IssuancePolicy {
                operators: ["alice".to_string()].into(),
                ..Default::default()
            },
            AuditLogger::disabled(),
        );
        router(state)
    }

    fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(bearer) = bearer {
            builder = builder.header("authorization", format!("Bearer {bearer}"));
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let (status, _, body) = send(
            app,
            request(
                "POST",
                "/api/login",
                None,
                Some(json!({ "username": username, "password": password })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = app().await;
        let response = app.oneshot(request("GET", "/healthz", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_and_bad_credentials() {
        let app = app().await;
        let token = login(&app, "alice", "alicepass").await;
        assert!(!token.is_empty());

        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/login",
                None,
                Some(json!({ "username": "alice", "password": "nope" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_valid_bearer() {
        let app = app().await;
        let (status, _, _) = send(&app, request("GET", "/api/devices", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) =
            send(&app, request("GET", "/api/devices", Some("garbage"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_header_is_accepted() {
        let app = app().await;
        let token = login(&app, "alice", "alicepass").await;
        let req = Request::builder()
            .uri("/api/auth/user")
            .header("x-session-token", token)
            .body(Body::empty())
            .unwrap();

        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["principal"]["username"], "alice");
        assert_eq!(body["tenant"], "t1");
    }

    #[tokio::test]
    async fn test_device_enrollment_and_gateway_headers() {
        let app = app().await;
        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/devices/auth",
                None,
                Some(json!({ "mac": "de:ad:be:ef", "tenant_id": "t1", "hostname": "edge" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["namespace"], "acme");
        let uid = body["uid"].as_str().unwrap().to_string();
        let token = body["token"].as_str().unwrap().to_string();

        let (status, headers, _) =
            send(&app, request("GET", "/internal/auth", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["x-device-uid"], uid.as_str());
        assert_eq!(headers["x-tenant-id"], "t1");
        assert_eq!(headers["x-read-only"], "false");

        let (status, _, _) = send(
            &app,
            request("POST", "/api/devices/auth", None, Some(json!({ "mac": "m", "tenant_id": "t9" }))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_devices_are_tenant_scoped() {
        let app = app().await;
        send(
            &app,
            request("POST", "/api/devices/auth", None, Some(json!({ "mac": "m1", "tenant_id": "t1" }))),
        )
        .await;
        let (_, _, body) = send(
            &app,
            request("POST", "/api/devices/auth", None, Some(json!({ "mac": "m2", "tenant_id": "t2" }))),
        )
        .await;
        let globex_uid = body["uid"].as_str().unwrap().to_string();

        let alice = login(&app, "alice", "alicepass").await;
        let (status, _, body) =
            send(&app, request("GET", "/api/devices", Some(&alice), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _, _) = send(
            &app,
            request("GET", &format!("/api/devices/{globex_uid}"), Some(&alice), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) =
            send(&app, request("GET", "/api/admin/devices", Some(&alice), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = send(
            &app,
            request("GET", "/api/admin/devices?reason=incident", Some(&alice), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let bob = login(&app, "bob", "bobpass").await;
        let (status, _, _) = send(
            &app,
            request("GET", "/api/admin/devices?reason=incident", Some(&bob), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_api_token_lifecycle_over_http() {
        let app = app().await;
        let alice = login(&app, "alice", "alicepass").await;

        let (status, _, body) = send(
            &app,
            request("POST", "/api/namespaces/acme/token", Some(&alice), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["read_only"], true);

        let (status, _, body) = send(
            &app,
            request("POST", "/api/namespaces/acme/token/bearer", Some(&alice), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let bearer = body["token"].as_str().unwrap().to_string();

        let (_, headers, _) =
            send(&app, request("GET", "/internal/auth", Some(&bearer), None)).await;
        assert_eq!(headers["x-read-only"], "true");
        assert_eq!(headers["x-tenant-id"], "t1");

        let (status, _, body) = send(
            &app,
            request("PATCH", "/api/namespaces/acme/token", Some(&alice), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["read_only"], false);

        let (_, headers, _) =
            send(&app, request("GET", "/internal/auth", Some(&bearer), None)).await;
        assert_eq!(headers["x-read-only"], "false");

        let (status, _, _) = send(
            &app,
            request("DELETE", "/api/namespaces/acme/token", Some(&alice), None),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, _) =
            send(&app, request("GET", "/internal/auth", Some(&bearer), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        send(
            &app,
            request("POST", "/api/namespaces/acme/token", Some(&alice), None),
        )
        .await;
        let (status, _, _) =
            send(&app, request("GET", "/internal/auth", Some(&bearer), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_foreign_namespace_token_is_refused() {
        let app = app().await;
        let bob = login(&app, "bob", "bobpass").await;
        let (status, _, _) = send(
            &app,
            request("POST", "/api/namespaces/acme/token", Some(&bob), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_membership_and_namespace_switch() {
        let app = app().await;
        let bob = login(&app, "bob", "bobpass").await;

        let (status, _, _) =
            send(&app, request("GET", "/api/auth/token/t1", Some(&bob), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let alice = login(&app, "alice", "alicepass").await;
        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/namespaces/acme/members",
                Some(&alice),
                Some(json!({ "username": "bob" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["members"].as_array().unwrap().len(), 2);

        let (status, _, body) =
            send(&app, request("GET", "/api/auth/token/t1", Some(&bob), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tenant"], "t1");

        let (status, _, _) = send(
            &app,
            request("DELETE", "/api/namespaces/acme/members/alice", Some(&alice), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_device_key_and_challenge() {
        let app = app().await;
        let (status, _, body) = send(&app, request("POST", "/internal/keys", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        let fingerprint = body["fingerprint"].as_str().unwrap().to_string();

        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/internal/challenge",
                None,
                Some(json!({ "fingerprint": fingerprint, "data": "nonce-123" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["signature"].as_str().unwrap().is_empty());

        let (status, _, _) = send(
            &app,
            request(
                "POST",
                "/internal/challenge",
                None,
                Some(json!({ "fingerprint": "unknown", "data": "x" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reissue_user_token() {
        let app = app().await;
        let (status, _, body) =
            send(&app, request("GET", "/internal/users/u-alice/token", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        let (status, _, _) =
            send(&app, request("GET", "/internal/users/ghost/token", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_public_key_routes() {
        let app = app().await;
        let alice = login(&app, "alice", "alicepass").await;
        let bob = login(&app, "bob", "bobpass").await;
        let key = portcullis_auth::challenge::generate_device_key().unwrap();

        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/public-keys",
                Some(&alice),
                Some(json!({ "name": "laptop", "data": key.public_key_pem })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let fingerprint = body["fingerprint"].as_str().unwrap().to_string();

        let (status, _, _) = send(
            &app,
            request(
                "POST",
                "/api/public-keys",
                Some(&alice),
                Some(json!({ "name": "bad", "data": "not a key" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) =
            send(&app, request("GET", "/api/public-keys", Some(&bob), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());

        let uri = format!("/api/public-keys/{fingerprint}");
        let (status, _, _) = send(&app, request("DELETE", &uri, Some(&bob), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = send(
            &app,
            request("PATCH", &uri, Some(&alice), Some(json!({ "name": "desktop" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "desktop");

        let (status, _, body) = send(
            &app,
            request("GET", &format!("/internal/public-keys/{fingerprint}/t1"), None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tenant_id"], "t1");
        let (status, _, _) = send(
            &app,
            request("GET", &format!("/internal/public-keys/{fingerprint}/t2"), None, None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(&app, request("DELETE", &uri, Some(&alice), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}

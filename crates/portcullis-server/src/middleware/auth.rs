//! Bearer authentication middleware.
//!
//! The bearer is read from `x-session-token` or `Authorization: Bearer`.
//! On success the [`RequestContext`](portcullis_auth::RequestContext) is
//! stored in the request extensions.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use portcullis_auth::AuthError;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Pull the bearer from the request headers.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return Some(token.trim());
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Reject requests without a valid bearer.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = extract_bearer(request.headers())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::unauthorized("missing bearer token"))?;

    let ctx = state.auth.authenticate(bearer).await?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

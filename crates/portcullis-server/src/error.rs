//! HTTP mapping of authentication errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portcullis_auth::AuthError;
use serde_json::json;

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::Crypto(e) if e.is_rejection() => StatusCode::UNAUTHORIZED,
            AuthError::NotFound { .. } => StatusCode::NOT_FOUND,
            AuthError::Duplicate { .. } => StatusCode::CONFLICT,
            AuthError::Crypto(_) | AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_store::StoreError;
    use portcullis_token::TokenError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::validation("bad"), StatusCode::BAD_REQUEST),
            (AuthError::unauthorized("no"), StatusCode::UNAUTHORIZED),
            (
                AuthError::Crypto(TokenError::Expired {
                    expired_at: "2024-01-01T00:00:00Z".into(),
                }),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AuthError::Crypto(TokenError::KeyFormat("bad pem".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::NotFound {
                    entity: "namespace",
                    key: "acme".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                AuthError::Duplicate {
                    entity: "user",
                    key: "alice".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                AuthError::from(StoreError::Backend("lock poisoned".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}

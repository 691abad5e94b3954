use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use warden_auth::AuthError;

use crate::middleware::GateError;

/// Failure of an auth endpoint handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(err) => auth_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "handler failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error")
            }
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            GateError::Unauthorized => {
                json_error(StatusCode::UNAUTHORIZED, "unauthorized", "unauthorized")
            }
            GateError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        }
    }
}

pub fn auth_error_to_response(err: AuthError) -> Response {
    match err {
        AuthError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid credentials",
        ),
        AuthError::InvalidRefreshToken => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_refresh_token",
            "invalid refresh token",
        ),
        AuthError::UserNotFound => {
            json_error(StatusCode::UNAUTHORIZED, "user_not_found", "user not found")
        }
        // Store detail stays in the logs.
        AuthError::StoreUnavailable(_) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "unavailable",
            "credential store unavailable",
        ),
        AuthError::Token(e) => {
            tracing::error!(error = %e, "token encoding failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "could not issue token",
            )
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

//! `/auth/*` endpoints. The authority does argon2 and store work, so each
//! call runs on the blocking pool.

use std::sync::Arc;

use axum::{Extension, Json, Router, routing::post};

use warden_auth::{LoginOutcome, SessionAuthority, TokenPair};

use crate::app::dto::{LoginRequest, RefreshRequest, ValidateRequest, ValidateResponse};
use crate::app::errors::ApiError;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/validate", post(validate))
        .route("/refresh", post(refresh))
}

pub async fn login(
    Extension(authority): Extension<Arc<SessionAuthority>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginOutcome>, ApiError> {
    let outcome =
        tokio::task::spawn_blocking(move || authority.login(&req.username, &req.password))
            .await??;
    Ok(Json(outcome))
}

pub async fn validate(
    Extension(authority): Extension<Arc<SessionAuthority>>,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let outcome = tokio::task::spawn_blocking(move || authority.validate_token(&req.token)).await?;
    Ok(Json(ValidateResponse::from_outcome(outcome)))
}

pub async fn refresh(
    Extension(authority): Extension<Arc<SessionAuthority>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = tokio::task::spawn_blocking(move || authority.refresh(&req.refresh_token)).await??;
    Ok(Json(pair))
}

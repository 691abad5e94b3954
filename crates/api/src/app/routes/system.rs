use axum::{Json, http::StatusCode, response::IntoResponse};

use warden_auth::AuthenticatedIdentity;

use crate::context::CurrentIdentity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(CurrentIdentity(identity): CurrentIdentity) -> Json<AuthenticatedIdentity> {
    Json(identity)
}

pub async fn admin_ping(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
    Json(serde_json::json!({
        "pong": true,
        "username": identity.username,
    }))
}

//! HTTP application wiring.
//!
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower_http::trace::TraceLayer;

use warden_auth::SessionAuthority;

use crate::middleware::Gate;
use crate::validator::TokenValidator;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `authority` serves `/auth/*`; `validator` backs the gate on protected
/// routes and may point at a different Warden instance.
pub fn build_app(authority: Arc<SessionAuthority>, validator: Arc<dyn TokenValidator>) -> Router {
    let gate = Gate::new(validator);

    let signed_in =
        gate.protect(Router::new().route("/whoami", get(routes::system::whoami)));

    let admin = gate
        .clone()
        .require_role("admin")
        .protect(Router::new().route("/admin/ping", get(routes::system::admin_ping)));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth::router())
        .merge(signed_in)
        .merge(admin)
        .layer(Extension(authority))
        .layer(TraceLayer::new_for_http())
}

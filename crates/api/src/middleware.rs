//! Access gate: bearer authentication and role requirements.
//!
//! `authenticate` must wrap every `require_role`; [`Gate::protect`] applies the
//! layers in that order.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::{Next, from_fn_with_state},
    response::Response,
};
use thiserror::Error;

use warden_auth::Role;

use crate::authz;
use crate::context;
use crate::validator::TokenValidator;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// Missing or malformed credential, or the token did not validate.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated, but lacking a required role.
    #[error("forbidden")]
    Forbidden,
}

#[derive(Clone)]
pub struct AuthState {
    pub validator: Arc<dyn TokenValidator>,
}

/// Role demanded by one `require_role` layer.
#[derive(Debug, Clone)]
pub struct RequiredRole(pub Role);

pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let token = extract_bearer(req.headers())?.to_owned();

    let outcome = state.validator.validate(&token).await.map_err(|e| {
        tracing::warn!(error = %e, "token validation unavailable");
        GateError::Unauthorized
    })?;

    let identity = outcome.into_identity().ok_or_else(|| {
        tracing::debug!("bearer token rejected");
        GateError::Unauthorized
    })?;

    context::attach_identity(req.extensions_mut(), identity);
    Ok(next.run(req).await)
}

pub async fn require_role(
    State(RequiredRole(role)): State<RequiredRole>,
    req: Request,
    next: Next,
) -> Result<Response, GateError> {
    authz::authorize_role(context::identity(req.extensions()), &role)?;
    Ok(next.run(req).await)
}

/// Accepts exactly `Bearer <token>`: one space, two parts, non-empty token.
fn extract_bearer(headers: &HeaderMap) -> Result<&str, GateError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(GateError::Unauthorized)?;

    let header = header.to_str().map_err(|_| GateError::Unauthorized)?;

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(GateError::Unauthorized),
    }
}

/// Builder for a gated group of routes.
///
/// Role requirements compose as logical AND and are checked in the order they
/// were added, all after authentication.
#[derive(Clone)]
pub struct Gate {
    validator: Arc<dyn TokenValidator>,
    roles: Vec<Role>,
}

impl Gate {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            validator,
            roles: Vec::new(),
        }
    }

    pub fn require_role(mut self, role: impl Into<Role>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        // Layers added later run earlier, so add role checks last-first and
        // authentication outermost.
        let router = self.roles.iter().rev().fold(router, |router, role| {
            router.layer(from_fn_with_state(RequiredRole(role.clone()), require_role))
        });

        router.layer(from_fn_with_state(
            AuthState {
                validator: Arc::clone(&self.validator),
            },
            authenticate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::{body::Body, http::StatusCode, routing::get};
    use tower::ServiceExt;
    use warden_auth::{
        AuthenticatedIdentity, InMemoryCredentialStore, PrincipalId, SessionAuthority,
        SessionConfig, ValidationOutcome,
    };

    use super::*;
    use crate::context::CurrentIdentity;
    use crate::validator::{LocalValidator, ValidatorError};

    struct StaticValidator(ValidationOutcome);

    #[async_trait]
    impl TokenValidator for StaticValidator {
        async fn validate(&self, _token: &str) -> Result<ValidationOutcome, ValidatorError> {
            Ok(self.0.clone())
        }
    }

    struct UnreachableValidator;

    #[async_trait]
    impl TokenValidator for UnreachableValidator {
        async fn validate(&self, _token: &str) -> Result<ValidationOutcome, ValidatorError> {
            Err(ValidatorError::Transport("connection refused".into()))
        }
    }

    fn identity_with(roles: &[&'static str]) -> ValidationOutcome {
        ValidationOutcome::Valid(AuthenticatedIdentity {
            principal_id: PrincipalId::new(42),
            username: "static".into(),
            roles: roles.iter().map(|r| Role::new(*r)).collect(),
        })
    }

    fn authority() -> Arc<SessionAuthority> {
        Arc::new(
            SessionAuthority::new(
                SessionConfig::new("gate-test-secret").unwrap(),
                Arc::new(InMemoryCredentialStore::with_demo_principals().unwrap()),
            )
            .unwrap(),
        )
    }

    fn counted_route(counter: &Arc<AtomicUsize>) -> Router {
        let counter = Arc::clone(counter);
        Router::new().route(
            "/protected",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "ok"
                }
            }),
        )
    }

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn call(app: Router, authorization: Option<&str>) -> StatusCode {
        app.oneshot(request(authorization)).await.unwrap().status()
    }

    #[tokio::test]
    async fn missing_header_never_reaches_handler() {
        let counter = Arc::new(AtomicUsize::new(0));
        let gate = Gate::new(Arc::new(StaticValidator(identity_with(&["admin"]))));

        let status = call(gate.protect(counted_route(&counter)), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_headers_are_unauthorized() {
        let counter = Arc::new(AtomicUsize::new(0));
        let gate = Gate::new(Arc::new(StaticValidator(identity_with(&["admin"]))));

        for header in [
            "",
            "Bearer",
            "Bearer ",
            "Bearer  token",
            "bearer token",
            "Basic dXNlcjpwYXNz",
            "Bearer token extra",
            "Token token",
            " Bearer token",
        ] {
            let status = call(gate.protect(counted_route(&counter)), Some(header)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "header {header:?}");
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized() {
        let counter = Arc::new(AtomicUsize::new(0));
        let gate = Gate::new(Arc::new(StaticValidator(ValidationOutcome::Invalid)));

        let status = call(gate.protect(counted_route(&counter)), Some("Bearer abc")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn validator_failure_is_unauthorized() {
        let counter = Arc::new(AtomicUsize::new(0));
        let gate = Gate::new(Arc::new(UnreachableValidator));

        let status = call(gate.protect(counted_route(&counter)), Some("Bearer abc")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn admin_token_passes_admin_gate_once() {
        let authority = authority();
        let token = authority.login("admin", "admin123").unwrap().tokens.access_token;
        let counter = Arc::new(AtomicUsize::new(0));
        let gate = Gate::new(Arc::new(LocalValidator::new(authority))).require_role("admin");

        let status = call(
            gate.protect(counted_route(&counter)),
            Some(&format!("Bearer {token}")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn admin_token_is_forbidden_from_superadmin_gate() {
        let authority = authority();
        let token = authority.login("admin", "admin123").unwrap().tokens.access_token;
        let counter = Arc::new(AtomicUsize::new(0));
        let gate = Gate::new(Arc::new(LocalValidator::new(authority))).require_role("superadmin");

        let status = call(
            gate.protect(counted_route(&counter)),
            Some(&format!("Bearer {token}")),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn role_gates_compose_as_and() {
        let counter = Arc::new(AtomicUsize::new(0));

        let only_admin = Gate::new(Arc::new(StaticValidator(identity_with(&["admin"]))))
            .require_role("admin")
            .require_role("auditor");
        let status = call(only_admin.protect(counted_route(&counter)), Some("Bearer t")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let both = Gate::new(Arc::new(StaticValidator(identity_with(&["auditor", "admin"]))))
            .require_role("admin")
            .require_role("auditor");
        let status = call(both.protect(counted_route(&counter)), Some("Bearer t")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn role_gate_without_authentication_is_unauthorized() {
        let counter = Arc::new(AtomicUsize::new(0));
        let app = counted_route(&counter).layer(from_fn_with_state(
            RequiredRole(Role::new("admin")),
            require_role,
        ));

        let status = call(app, Some("Bearer whatever")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_sees_identity() {
        let gate = Gate::new(Arc::new(StaticValidator(identity_with(&["user"]))));
        let app = gate.protect(Router::new().route(
            "/protected",
            get(|CurrentIdentity(identity): CurrentIdentity| async move { identity.username }),
        ));

        let res = app.oneshot(request(Some("Bearer t"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"static");
    }

    #[test]
    fn extract_bearer_returns_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer(&headers), Ok("abc.def.ghi"));
    }
}

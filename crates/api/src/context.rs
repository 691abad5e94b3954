//! Request-scoped identity.
//!
//! The gate stores the resolved identity in the request's extensions under a
//! private key type, so nothing outside this module can forge or collide with
//! it. Handlers read it through [`CurrentIdentity`].

use axum::extract::FromRequestParts;
use axum::http::Extensions;
use axum::http::request::Parts;

use warden_auth::AuthenticatedIdentity;

use crate::middleware::GateError;

#[derive(Debug, Clone)]
struct IdentityKey(AuthenticatedIdentity);

pub(crate) fn attach_identity(extensions: &mut Extensions, identity: AuthenticatedIdentity) {
    extensions.insert(IdentityKey(identity));
}

/// Identity attached by `authenticate`, if it ran for this request.
pub fn identity(extensions: &Extensions) -> Option<&AuthenticatedIdentity> {
    extensions.get::<IdentityKey>().map(|key| &key.0)
}

/// Extractor for the authenticated identity of the current request.
///
/// Rejects with `401` when the route is not behind `authenticate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentIdentity(pub AuthenticatedIdentity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity(&parts.extensions)
            .cloned()
            .map(CurrentIdentity)
            .ok_or(GateError::Unauthorized)
    }
}

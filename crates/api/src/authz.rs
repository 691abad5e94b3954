//! Role check applied by the `require_role` gate.

use warden_auth::{AuthenticatedIdentity, Role};

use crate::middleware::GateError;

/// Decide whether `identity` may pass a gate requiring `required`.
///
/// - No identity means authentication never ran for this request: `Unauthorized`.
/// - An identity without the role (exact match): `Forbidden`.
pub fn authorize_role(
    identity: Option<&AuthenticatedIdentity>,
    required: &Role,
) -> Result<(), GateError> {
    let identity = identity.ok_or(GateError::Unauthorized)?;

    if identity.has_role(required) {
        Ok(())
    } else {
        tracing::debug!(
            principal_id = %identity.principal_id,
            required = %required,
            "role check failed"
        );
        Err(GateError::Forbidden)
    }
}

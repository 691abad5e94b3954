use core::str::FromStr;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Numeric identifier of a principal, assigned by the credential store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(i64);

impl PrincipalId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for PrincipalId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<PrincipalId> for i64 {
    fn from(value: PrincipalId) -> Self {
        value.0
    }
}

impl FromStr for PrincipalId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(i64::from_str(s)?))
    }
}

/// A credential record as held by the credential store.
///
/// `password_digest` is a PHC-formatted argon2 string; the plaintext password
/// never leaves [`crate::password`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: String,
    pub password_digest: String,
    pub roles: BTreeSet<Role>,
}

impl Principal {
    pub fn new(
        id: PrincipalId,
        username: impl Into<String>,
        password_digest: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            password_digest: password_digest.into(),
            roles: roles.into_iter().collect(),
        }
    }

    /// Identity view of this record (no credential material).
    pub fn identity(&self) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            principal_id: self.id,
            username: self.username.clone(),
            roles: self.roles.iter().cloned().collect(),
        }
    }
}

/// Identity resolved for a single authenticated call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    #[serde(rename = "id")]
    pub principal_id: PrincipalId,
    pub username: String,
    pub roles: Vec<Role>,
}

impl AuthenticatedIdentity {
    pub fn has_role(&self, role: &Role) -> bool {
        crate::roles::has_role(&self.roles, role)
    }
}

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role label attached to a principal.
///
/// Roles are flat, opaque strings. Membership checks are exact string matches;
/// there is no hierarchy and no wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Returns true when `roles` contains `required` (exact match).
pub fn has_role(roles: &[Role], required: &Role) -> bool {
    roles.iter().any(|r| r == required)
}

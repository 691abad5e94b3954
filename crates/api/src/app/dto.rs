use serde::{Deserialize, Serialize};

use warden_auth::{AuthenticatedIdentity, ValidationOutcome};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub token: String,
}

/// Wire form of a [`ValidationOutcome`]; `identity` is present iff `valid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<AuthenticatedIdentity>,
}

impl ValidateResponse {
    pub fn from_outcome(outcome: ValidationOutcome) -> Self {
        match outcome {
            ValidationOutcome::Valid(identity) => Self {
                valid: true,
                identity: Some(identity),
            },
            ValidationOutcome::Invalid => Self {
                valid: false,
                identity: None,
            },
        }
    }

    /// A `valid: true` answer without an identity is treated as invalid.
    pub fn into_outcome(self) -> ValidationOutcome {
        match (self.valid, self.identity) {
            (true, Some(identity)) => ValidationOutcome::Valid(identity),
            _ => ValidationOutcome::Invalid,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

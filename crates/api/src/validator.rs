//! Where the gate sends tokens for validation.
//!
//! [`LocalValidator`] calls an in-process [`SessionAuthority`];
//! [`RemoteValidator`] calls the `/auth/validate` endpoint of a Warden
//! instance elsewhere. Neither retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use warden_auth::{SessionAuthority, ValidationOutcome};

use crate::app::dto::{ValidateRequest, ValidateResponse};

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("validation transport failed: {0}")]
    Transport(String),

    #[error("validation endpoint returned status {0}")]
    UnexpectedStatus(u16),

    #[error("validation task failed: {0}")]
    Internal(String),
}

#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// `Ok(Invalid)` is a normal answer; `Err` means no answer was obtained.
    async fn validate(&self, token: &str) -> Result<ValidationOutcome, ValidatorError>;
}

/// Validates against a session authority in this process.
#[derive(Debug, Clone)]
pub struct LocalValidator {
    authority: Arc<SessionAuthority>,
}

impl LocalValidator {
    pub fn new(authority: Arc<SessionAuthority>) -> Self {
        Self { authority }
    }
}

#[async_trait]
impl TokenValidator for LocalValidator {
    async fn validate(&self, token: &str) -> Result<ValidationOutcome, ValidatorError> {
        // The store lookup may block; keep it off the reactor.
        let authority = Arc::clone(&self.authority);
        let token = token.to_owned();
        tokio::task::spawn_blocking(move || authority.validate_token(&token))
            .await
            .map_err(|e| ValidatorError::Internal(e.to_string()))
    }
}

/// Validates by calling a remote Warden `/auth/validate` endpoint.
#[derive(Debug, Clone)]
pub struct RemoteValidator {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteValidator {
    /// `base_url` is the remote service root, e.g. `http://auth:8080`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ValidatorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValidatorError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/auth/validate", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenValidator for RemoteValidator {
    async fn validate(&self, token: &str) -> Result<ValidationOutcome, ValidatorError> {
        let res = self
            .client
            .post(&self.endpoint)
            .json(&ValidateRequest {
                token: token.to_owned(),
            })
            .send()
            .await
            .map_err(|e| ValidatorError::Transport(e.to_string()))?;

        if !res.status().is_success() {
            return Err(ValidatorError::UnexpectedStatus(res.status().as_u16()));
        }

        let body: ValidateResponse = res
            .json()
            .await
            .map_err(|e| ValidatorError::Transport(e.to_string()))?;

        Ok(body.into_outcome())
    }
}

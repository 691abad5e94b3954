//! Session authority: login, token validation and refresh.
//!
//! Stateless: every call stands alone and nothing is written server-side. A
//! consequence is that tokens cannot be revoked before they expire, and a
//! refresh token stays usable for its whole lifetime even after it has been
//! exchanged.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::claims::{ClaimSet, TokenKind};
use crate::codec::{TokenCodec, TokenError};
use crate::password::{PasswordError, hash_password, verify_password};
use crate::store::{CredentialStore, StoreError};
use crate::{AuthenticatedIdentity, Principal};

pub const DEFAULT_ACCESS_LIFETIME_SECS: i64 = 24 * 60 * 60;
pub const DEFAULT_REFRESH_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;
/// Upper bound for either lifetime; keeps `iat + lifetime` well inside
/// chrono's representable range.
pub const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("{0} lifetime must be positive")]
    NonPositiveLifetime(&'static str),

    #[error("{0} lifetime must not exceed ten years")]
    LifetimeTooLong(&'static str),

    #[error("failed to prepare credential verifier: {0}")]
    Digest(#[from] PasswordError),
}

/// Signing secret and token lifetimes, fixed for the life of the process.
#[derive(Clone)]
pub struct SessionConfig {
    secret: Vec<u8>,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl core::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish()
    }
}

impl SessionConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self {
            secret,
            access_lifetime: Duration::seconds(DEFAULT_ACCESS_LIFETIME_SECS),
            refresh_lifetime: Duration::seconds(DEFAULT_REFRESH_LIFETIME_SECS),
        })
    }

    pub fn with_access_lifetime(mut self, lifetime: Duration) -> Result<Self, ConfigError> {
        check_lifetime(lifetime, "access")?;
        self.access_lifetime = lifetime;
        Ok(self)
    }

    pub fn with_refresh_lifetime(mut self, lifetime: Duration) -> Result<Self, ConfigError> {
        check_lifetime(lifetime, "refresh")?;
        self.refresh_lifetime = lifetime;
        Ok(self)
    }

    pub fn access_lifetime(&self) -> Duration {
        self.access_lifetime
    }

    pub fn refresh_lifetime(&self) -> Duration {
        self.refresh_lifetime
    }
}

fn check_lifetime(lifetime: Duration, kind: &'static str) -> Result<(), ConfigError> {
    if lifetime <= Duration::zero() {
        return Err(ConfigError::NonPositiveLifetime(kind));
    }
    if lifetime > Duration::seconds(MAX_LIFETIME_SECS) {
        return Err(ConfigError::LifetimeTooLong(kind));
    }
    Ok(())
}

/// Coarse, enumeration-resistant failures of login and refresh.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username or wrong password; the two are never distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("user not found")]
    UserNotFound,

    #[error("credential store unavailable")]
    StoreUnavailable(String),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry of the access token.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub identity: AuthenticatedIdentity,
}

/// Result of validating a token. Invalidity is an ordinary outcome, not an
/// error, and never says why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid(AuthenticatedIdentity),
    Invalid,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        match self {
            Self::Valid(identity) => Some(identity),
            Self::Invalid => None,
        }
    }

    pub fn into_identity(self) -> Option<AuthenticatedIdentity> {
        match self {
            Self::Valid(identity) => Some(identity),
            Self::Invalid => None,
        }
    }
}

/// Issues, validates and refreshes session tokens.
///
/// Roles returned from validation come from the live credential store record,
/// not from the token: a role granted or revoked after issuance takes effect
/// on the next validated call. The `roles` claim inside access tokens is
/// informational for clients.
pub struct SessionAuthority {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    // Verified against when the username is unknown, so both failure paths
    // pay for one argon2 verification.
    dummy_digest: String,
}

impl core::fmt::Debug for SessionAuthority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionAuthority")
            .field("codec", &self.codec)
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}

impl SessionAuthority {
    pub fn new(config: SessionConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ConfigError> {
        let dummy_digest = hash_password("warden-dummy-credential")?;
        Ok(Self {
            store,
            codec: TokenCodec::new(&config.secret),
            access_lifetime: config.access_lifetime,
            refresh_lifetime: config.refresh_lifetime,
            dummy_digest,
        })
    }

    pub fn access_lifetime(&self) -> Duration {
        self.access_lifetime
    }

    pub fn refresh_lifetime(&self) -> Duration {
        self.refresh_lifetime
    }

    pub fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        self.login_at(username, password, Utc::now())
    }

    pub fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        let principal = self.store.find_by_username(username).map_err(|e| {
            tracing::warn!(error = %e, "credential lookup failed during login");
            AuthError::from(e)
        })?;

        let principal = match principal {
            Some(p) if verify_password(&p.password_digest, password) => p,
            Some(_) => {
                tracing::debug!("login rejected");
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                let _ = verify_password(&self.dummy_digest, password);
                tracing::debug!("login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let tokens = self.mint_pair(&principal, now)?;
        tracing::info!(principal_id = %principal.id, "login succeeded");

        Ok(LoginOutcome {
            tokens,
            identity: principal.identity(),
        })
    }

    pub fn validate_token(&self, token: &str) -> ValidationOutcome {
        self.validate_token_at(token, Utc::now())
    }

    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> ValidationOutcome {
        let claims = match self.codec.decode(token, now) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(reason = %e, "token rejected");
                return ValidationOutcome::Invalid;
            }
        };

        if claims.token_kind != TokenKind::Access {
            tracing::debug!("non-access token presented for validation");
            return ValidationOutcome::Invalid;
        }

        match self.resolve(&claims) {
            Ok(Some(principal)) => ValidationOutcome::Valid(principal.identity()),
            Ok(None) => {
                tracing::debug!(principal_id = %claims.principal_id, "token subject no longer exists");
                ValidationOutcome::Invalid
            }
            Err(e) => {
                tracing::warn!(error = %e, "credential lookup failed during validation");
                ValidationOutcome::Invalid
            }
        }
    }

    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.refresh_at(refresh_token, Utc::now())
    }

    pub fn refresh_at(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<TokenPair, AuthError> {
        let claims = self.codec.decode(refresh_token, now).map_err(|e| {
            tracing::debug!(reason = %e, "refresh token rejected");
            AuthError::InvalidRefreshToken
        })?;

        // An access token must never be exchangeable for a fresh pair.
        if claims.token_kind != TokenKind::Refresh {
            tracing::debug!("access token presented as refresh token");
            return Err(AuthError::InvalidRefreshToken);
        }

        let principal = self
            .resolve(&claims)
            .map_err(|e| {
                tracing::warn!(error = %e, "credential lookup failed during refresh");
                AuthError::from(e)
            })?
            .ok_or(AuthError::UserNotFound)?;

        let tokens = self.mint_pair(&principal, now)?;
        tracing::info!(principal_id = %principal.id, "session refreshed");
        Ok(tokens)
    }

    /// Look the subject up again; a record recreated under the same username
    /// with a different id does not inherit old tokens.
    fn resolve(&self, claims: &ClaimSet) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .store
            .find_by_username(&claims.subject)?
            .filter(|p| p.id == claims.principal_id))
    }

    fn mint_pair(&self, principal: &Principal, now: DateTime<Utc>) -> Result<TokenPair, AuthError> {
        let access = ClaimSet::access(principal, now, self.access_lifetime);
        let refresh = ClaimSet::refresh(principal, now, self.refresh_lifetime);

        Ok(TokenPair {
            access_token: self.codec.encode(&access)?,
            refresh_token: self.codec.encode(&refresh)?,
            expires_at: access.expires_at,
        })
    }
}

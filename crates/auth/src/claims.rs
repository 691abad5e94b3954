use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{Principal, PrincipalId, Role};

/// What a token may be used for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Authorizes protected calls; carries roles.
    Access,
    /// Only mints a new access/refresh pair; never carries roles.
    Refresh,
}

/// Claim set signed into every token.
///
/// Timestamps are whole seconds (they travel as unix seconds), so a claim set
/// built with [`ClaimSet::access`] or [`ClaimSet::refresh`] survives an
/// encode/decode cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Username of the principal.
    #[serde(rename = "sub")]
    pub subject: String,

    #[serde(rename = "pid")]
    pub principal_id: PrincipalId,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    /// Present on access tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,

    #[serde(rename = "kind")]
    pub token_kind: TokenKind,

    /// Unique token id; keeps two tokens minted in the same second distinct.
    #[serde(rename = "jti")]
    pub token_id: Uuid,
}

impl ClaimSet {
    pub fn access(principal: &Principal, now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self::mint(
            principal,
            now,
            lifetime,
            TokenKind::Access,
            Some(principal.roles.iter().cloned().collect()),
        )
    }

    pub fn refresh(principal: &Principal, now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self::mint(principal, now, lifetime, TokenKind::Refresh, None)
    }

    fn mint(
        principal: &Principal,
        now: DateTime<Utc>,
        lifetime: Duration,
        token_kind: TokenKind,
        roles: Option<Vec<Role>>,
    ) -> Self {
        let issued_at = now.trunc_subsecs(0);
        Self {
            subject: principal.username.clone(),
            principal_id: principal.id,
            issued_at,
            expires_at: issued_at + lifetime,
            roles,
            token_kind,
            token_id: Uuid::now_v7(),
        }
    }

    pub fn is_refresh(&self) -> bool {
        self.token_kind == TokenKind::Refresh
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("refresh token carries role claims")]
    RolesOnRefresh,
}

/// Deterministically validate a decoded claim set against `now`.
///
/// Signature verification happens in [`crate::codec`]; this checks the claims
/// themselves.
pub fn validate_claims(claims: &ClaimSet, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if claims.is_refresh() && claims.roles.is_some() {
        return Err(TokenValidationError::RolesOnRefresh);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

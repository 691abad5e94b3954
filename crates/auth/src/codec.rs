//! Token codec: claim set <-> compact signed token.
//!
//! Tokens are HS256 JWTs. Only HS256 is accepted on decode; a token whose
//! header names any other algorithm is rejected as a signature mismatch.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{ClaimSet, TokenValidationError, validate_claims};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature mismatch")]
    SignatureMismatch,

    #[error("token has expired")]
    Expired,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::SignatureMismatch,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(err.to_string()),
        }
    }
}

impl From<TokenValidationError> for TokenError {
    fn from(err: TokenValidationError) -> Self {
        match err {
            TokenValidationError::Expired => Self::Expired,
            other => Self::Malformed(other.to_string()),
        }
    }
}

/// A header that is valid JSON but whose `alg` is not an algorithm
/// jsonwebtoken supports (e.g. `none`) fails as a serde data error.
fn header_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::Json(e) if e.is_data() => TokenError::SignatureMismatch,
        _ => TokenError::from(err),
    }
}

/// Signs and verifies claim sets with a process-wide shared secret.
///
/// The secret must be non-empty; [`crate::SessionConfig`] enforces this for
/// the authority's codec.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.header.alg)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the caller's `now` in `validate_claims`.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            header: Header::new(ALGORITHM),
            validation,
        }
    }

    pub fn encode(&self, claims: &ClaimSet) -> Result<String, TokenError> {
        jsonwebtoken::encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify `token` and return its claim set, judged as of `now`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<ClaimSet, TokenError> {
        let header = jsonwebtoken::decode_header(token).map_err(header_error)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::SignatureMismatch);
        }

        let data = jsonwebtoken::decode::<ClaimSet>(token, &self.decoding_key, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

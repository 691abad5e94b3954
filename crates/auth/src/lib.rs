//! `warden-auth`: credential verification and signed session tokens.
//!
//! This crate is decoupled from HTTP: the API layer wraps it, and the
//! credential store is injected.

pub mod claims;
pub mod codec;
pub mod password;
pub mod principal;
pub mod roles;
pub mod session;
pub mod store;

pub use claims::{ClaimSet, TokenKind, TokenValidationError, validate_claims};
pub use codec::{TokenCodec, TokenError};
pub use password::{PasswordError, hash_password, verify_password};
pub use principal::{AuthenticatedIdentity, Principal, PrincipalId};
pub use roles::{Role, has_role};
pub use session::{
    AuthError, ConfigError, LoginOutcome, SessionAuthority, SessionConfig, TokenPair,
    ValidationOutcome,
};
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError};

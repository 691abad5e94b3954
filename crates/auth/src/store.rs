//! Credential store capability and an in-memory implementation.
//!
//! The session authority only ever sees [`CredentialStore`]; persistence is
//! somebody else's concern.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::password::{PasswordError, hash_password};
use crate::{Principal, PrincipalId, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate principal: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Digest(#[from] PasswordError),
}

/// Lookup of principals by username (exact, case-sensitive).
///
/// Implementations may block (e.g. a database round trip). Callers never hold
/// a lock of their own across this call.
pub trait CredentialStore: Send + Sync {
    fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError>;
}

impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError> {
        (**self).find_by_username(username)
    }
}

/// In-memory principal table for tests/dev and single-process deployments.
///
/// All reads and writes go through one `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    principals: RwLock<HashMap<String, Principal>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `admin/admin123` (admin) and `user/user123` (user).
    pub fn with_demo_principals() -> Result<Self, StoreError> {
        let store = Self::new();
        store.register(PrincipalId::new(1), "admin", "admin123", [Role::new("admin")])?;
        store.register(PrincipalId::new(2), "user", "user123", [Role::new("user")])?;
        Ok(store)
    }

    /// Hash `password` and insert a new principal.
    pub fn register(
        &self,
        id: PrincipalId,
        username: &str,
        password: &str,
        roles: impl IntoIterator<Item = Role>,
    ) -> Result<Principal, StoreError> {
        let principal = Principal::new(id, username, hash_password(password)?, roles);
        self.insert(principal.clone())?;
        Ok(principal)
    }

    /// Insert a principal. Usernames and ids must both be unique.
    pub fn insert(&self, principal: Principal) -> Result<(), StoreError> {
        let mut map = self.write()?;

        if map.contains_key(&principal.username) {
            return Err(StoreError::Duplicate(format!(
                "username '{}' already exists",
                principal.username
            )));
        }
        if map.values().any(|p| p.id == principal.id) {
            return Err(StoreError::Duplicate(format!(
                "principal id {} already exists",
                principal.id
            )));
        }

        map.insert(principal.username.clone(), principal);
        Ok(())
    }

    pub fn remove(&self, username: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self.write()?.remove(username))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.is_empty())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Principal>>, StoreError> {
        self.principals
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Principal>>, StoreError> {
        self.principals
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self.read()?.get(username).cloned())
    }
}

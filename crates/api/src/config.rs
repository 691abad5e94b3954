//! Process configuration, read from `WARDEN_*` environment variables through
//! the `config` crate.

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use config::{Config, Environment};
use serde::Deserialize;
use thiserror::Error;

use warden_auth::{SessionConfig, session};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid session configuration: {0}")]
    Session(#[from] warden_auth::ConfigError),

    #[error("{0} is out of range")]
    OutOfRange(&'static str),
}

#[derive(Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// HS256 signing secret. Required.
    pub jwt_secret: String,

    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: i64,

    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,

    /// When set, the gate validates tokens against this remote Warden instead
    /// of the local authority.
    #[serde(default)]
    pub remote_validate_url: Option<String>,

    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,

    #[serde(default)]
    pub seed_demo_users: bool,

    #[serde(default = "default_log_json")]
    pub log_json: bool,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_access_ttl_secs() -> i64 {
    session::DEFAULT_ACCESS_LIFETIME_SECS
}

fn default_refresh_ttl_secs() -> i64 {
    session::DEFAULT_REFRESH_LIFETIME_SECS
}

fn default_remote_timeout_ms() -> u64 {
    2_000
}

fn default_log_json() -> bool {
    true
}

impl core::fmt::Debug for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("remote_validate_url", &self.remote_validate_url)
            .field("remote_timeout_ms", &self.remote_timeout_ms)
            .field("seed_demo_users", &self.seed_demo_users)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Settings {
    /// Loads and checks settings from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if `WARDEN_JWT_SECRET` is missing or empty, or any value does not
    /// parse or is out of range.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_environment(Environment::with_prefix("WARDEN"))
    }

    fn from_environment(env: Environment) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        // Fail at startup rather than on first login.
        settings.session()?;
        Ok(settings)
    }

    pub fn session(&self) -> Result<SessionConfig, SettingsError> {
        let access = Duration::try_seconds(self.access_ttl_secs)
            .ok_or(SettingsError::OutOfRange("access_ttl_secs"))?;
        let refresh = Duration::try_seconds(self.refresh_ttl_secs)
            .ok_or(SettingsError::OutOfRange("refresh_ttl_secs"))?;

        Ok(SessionConfig::new(self.jwt_secret.as_bytes())?
            .with_access_lifetime(access)?
            .with_refresh_lifetime(refresh)?)
    }

    pub fn remote_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.remote_timeout_ms)
    }
}

use std::sync::Arc;

use anyhow::Context;

use warden_api::config::Settings;
use warden_api::{LocalValidator, RemoteValidator, TokenValidator};
use warden_auth::{InMemoryCredentialStore, SessionAuthority};
use warden_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("invalid configuration")?;

    warden_observability::init(LogFormat::from_json_flag(settings.log_json));

    let store = if settings.seed_demo_users {
        tracing::warn!("seeding demo users admin/user; do not use in production");
        InMemoryCredentialStore::with_demo_principals().context("failed to seed demo users")?
    } else {
        InMemoryCredentialStore::new()
    };

    let authority = Arc::new(
        SessionAuthority::new(settings.session()?, Arc::new(store))
            .context("failed to build session authority")?,
    );

    let validator: Arc<dyn TokenValidator> = match settings.remote_validate_url.as_deref() {
        Some(url) => {
            tracing::info!(url, "validating tokens remotely");
            Arc::new(RemoteValidator::new(url, settings.remote_timeout())?)
        }
        None => Arc::new(LocalValidator::new(Arc::clone(&authority))),
    };

    let app = warden_api::build_app(authority, validator);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

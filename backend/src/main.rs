//! Backend entry-point: loads settings, prepares storage and serves the
//! REST API, the notification socket and the OpenAPI docs.

mod server;

use std::path::Path;

use actix_web::cookie::Key;
use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use khidma::inbound::http::health::HealthState;
use khidma::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use khidma::settings::ServerSettings;
use server::{ServerConfig, create_server};

fn load_session_key(path: &Path, allow_ephemeral: bool) -> std::io::Result<Key> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            if cfg!(debug_assertions) || allow_ephemeral {
                warn!(path = %path.display(), error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {}: {e}",
                    path.display()
                )))
            }
        }
    }
}

async fn connect_database(settings: &ServerSettings) -> std::io::Result<Option<DbPool>> {
    let Some(url) = settings.database_url.as_deref() else {
        return Ok(None);
    };
    run_migrations(url)
        .await
        .map_err(|e| std::io::Error::other(format!("database migration failed: {e}")))?;
    let pool = DbPool::connect(PoolConfig::new(url).with_max_size(settings.pool_max_size()))
        .await
        .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;
    Ok(Some(pool))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load()
        .map_err(|e| std::io::Error::other(format!("invalid configuration: {e}")))?;
    let key = load_session_key(&settings.session_key_file(), settings.session_allow_ephemeral)?;

    let mut config = ServerConfig::new(key, settings.clone());
    if let Some(pool) = connect_database(&settings).await? {
        config = config.with_db_pool(pool);
    }
    let bind_addr = config.bind_addr();

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config).await?;
    info!(%bind_addr, "khidma listening");
    let result = server.await;
    health_state.mark_unhealthy();
    result
}

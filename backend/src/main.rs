//! Relay backend entry-point: configuration, migrations, and server start.

mod server;

use std::io;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use relay_backend::inbound::http::health::HealthState;
use relay_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use relay_backend::settings::RelaySettings;
use server::ServerConfig;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = RelaySettings::load().map_err(io::Error::other)?;
    let bind_addr = settings.resolve_bind_addr().map_err(io::Error::other)?;
    let database_url = settings.resolve_database_url().map_err(io::Error::other)?;
    let policy = settings.handshake_policy();

    let migration_url = database_url.clone();
    tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
        .await
        .map_err(|e| io::Error::other(format!("migration task failed: {e}")))?
        .map_err(io::Error::other)?;
    info!("database migrations applied");

    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(bind_addr, policy).with_db_pool(pool);
    let server = server::create_server(health_state, config)?;

    info!(%bind_addr, "relay backend listening");
    server.await
}

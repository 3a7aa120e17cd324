//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each adapter implements one domain repository port over the shared
//! async connection pool. Schema migrations are embedded so deployments
//! can apply them at startup.

mod diesel_error_mapping;
mod diesel_handshake_repository;
mod diesel_mapping_repository;
mod diesel_order_repository;
mod diesel_restaurant_repository;
mod models;
mod pool;
pub(crate) mod schema;

use diesel::Connection as _;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub use diesel_handshake_repository::DieselHandshakeRepository;
pub use diesel_mapping_repository::DieselMappingRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_restaurant_repository::DieselRestaurantRepository;
pub use pool::{DbPool, PoolConfig, PoolError};

/// Migrations compiled into the binary from `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply any pending embedded migrations over a blocking connection.
///
/// Runs at startup before the async pool is built; call it from
/// `spawn_blocking` in async contexts.
///
/// # Errors
///
/// Returns a description of the connection or migration failure.
pub fn run_pending_migrations(database_url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| format!("connect for migrations: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|err| format!("apply migrations: {err}"))
}

//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use relay_backend::domain::HandshakePolicy;
use relay_backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) policy: HandshakePolicy,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration from resolved settings.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, policy: HandshakePolicy) -> Self {
        Self {
            bind_addr,
            policy,
            db_pool: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without a pool the server wires fixture ports, which is only useful
    /// for tests and smoke runs.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

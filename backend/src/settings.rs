//! Runtime configuration loaded via OrthoConfig.
//!
//! All deployment-specific values (store URL, bind address, handshake
//! limits) are resolved once at process start from `RELAY_*` environment
//! variables, CLI flags, or config files, then passed into constructors.
//! Nothing reads configuration from global scope mid-request.

use std::net::SocketAddr;

use chrono::Duration;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::HandshakePolicy;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Configuration values for the relay backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RELAY")]
pub struct RelaySettings {
    /// PostgreSQL connection URL. Falls back to `DATABASE_URL` when unset.
    pub database_url: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Minutes a handshake request stays answerable.
    pub handshake_ttl_minutes: Option<i64>,
    /// Handshake requests allowed per address within the window.
    pub rate_limit_max_requests: Option<u64>,
    /// Trailing rate-limit window in minutes.
    pub rate_limit_window_minutes: Option<i64>,
}

/// Errors raised while resolving settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The bind address did not parse as `host:port`.
    #[error("bind address {value:?} is not a valid socket address")]
    InvalidBindAddr {
        /// The rejected value.
        value: String,
    },
    /// No database URL was configured anywhere.
    #[error("no database URL configured; set RELAY_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,
}

impl RelaySettings {
    /// The socket address to bind, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Rejects values that do not parse as a socket address.
    pub fn resolve_bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::InvalidBindAddr {
            value: raw.to_owned(),
        })
    }

    /// The database URL, falling back to the conventional `DATABASE_URL`.
    ///
    /// # Errors
    ///
    /// Fails when neither source is set.
    pub fn resolve_database_url(&self) -> Result<String, SettingsError> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Handshake limits, with protocol defaults for anything unset.
    #[must_use]
    pub fn handshake_policy(&self) -> HandshakePolicy {
        let defaults = HandshakePolicy::default();
        HandshakePolicy {
            request_ttl: self
                .handshake_ttl_minutes
                .map_or(defaults.request_ttl, Duration::minutes),
            rate_limit_max_requests: self
                .rate_limit_max_requests
                .unwrap_or(defaults.rate_limit_max_requests),
            rate_limit_window: self
                .rate_limit_window_minutes
                .map_or(defaults.rate_limit_window, Duration::minutes),
        }
    }
}

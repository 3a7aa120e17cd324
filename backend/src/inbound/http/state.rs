//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    HandshakeCommand, HandshakeQuery, OrderQuery, OrderRelayCommand, OrderStatusCommand,
    RegistrationCommand,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Registration use-case.
    pub registration: Arc<dyn RegistrationCommand>,
    /// Handshake submission and response use-case.
    pub handshake: Arc<dyn HandshakeCommand>,
    /// Kitchen-side handshake polling.
    pub handshake_query: Arc<dyn HandshakeQuery>,
    /// Order relay use-case.
    pub order_relay: Arc<dyn OrderRelayCommand>,
    /// Kitchen-side status transitions.
    pub order_status: Arc<dyn OrderStatusCommand>,
    /// Kitchen-side order reads.
    pub orders_query: Arc<dyn OrderQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Registration use-case.
    pub registration: Arc<dyn RegistrationCommand>,
    /// Handshake submission and response use-case.
    pub handshake: Arc<dyn HandshakeCommand>,
    /// Kitchen-side handshake polling.
    pub handshake_query: Arc<dyn HandshakeQuery>,
    /// Order relay use-case.
    pub order_relay: Arc<dyn OrderRelayCommand>,
    /// Kitchen-side status transitions.
    pub order_status: Arc<dyn OrderStatusCommand>,
    /// Kitchen-side order reads.
    pub orders_query: Arc<dyn OrderQuery>,
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use relay_backend::domain::ports::{
    ///     FixtureHandshakeCommand, FixtureHandshakeQuery, FixtureOrderQuery,
    ///     FixtureOrderRelayCommand, FixtureOrderStatusCommand, FixtureRegistrationCommand,
    /// };
    /// use relay_backend::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let state = HttpState::new(HttpStatePorts {
    ///     registration: Arc::new(FixtureRegistrationCommand),
    ///     handshake: Arc::new(FixtureHandshakeCommand),
    ///     handshake_query: Arc::new(FixtureHandshakeQuery),
    ///     order_relay: Arc::new(FixtureOrderRelayCommand),
    ///     order_status: Arc::new(FixtureOrderStatusCommand),
    ///     orders_query: Arc::new(FixtureOrderQuery),
    /// });
    /// let _registration = state.registration.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            registration,
            handshake,
            handshake_query,
            order_relay,
            order_status,
            orders_query,
        } = ports;
        Self {
            registration,
            handshake,
            handshake_query,
            order_relay,
            order_status,
            orders_query,
        }
    }
}

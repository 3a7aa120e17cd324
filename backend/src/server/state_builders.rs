//! Builders for HTTP state ports and repository-backed services.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use relay_backend::domain::ports::{
    FixtureHandshakeCommand, FixtureHandshakeQuery, FixtureOrderQuery, FixtureOrderRelayCommand,
    FixtureOrderStatusCommand, FixtureRegistrationCommand,
};
use relay_backend::domain::{
    HandshakeService, KitchenOrderService, OrderRelayService, RegistrationService,
};
use relay_backend::inbound::http::state::{HttpState, HttpStatePorts};
use relay_backend::outbound::persistence::{
    DieselHandshakeRepository, DieselMappingRepository, DieselOrderRepository,
    DieselRestaurantRepository,
};

use super::ServerConfig;

/// Wire the HTTP state: database-backed services when a pool is
/// configured, fixtures otherwise.
pub(crate) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let state = config.db_pool.as_ref().map_or_else(
        || {
            HttpState::new(HttpStatePorts {
                registration: Arc::new(FixtureRegistrationCommand),
                handshake: Arc::new(FixtureHandshakeCommand),
                handshake_query: Arc::new(FixtureHandshakeQuery),
                order_relay: Arc::new(FixtureOrderRelayCommand),
                order_status: Arc::new(FixtureOrderStatusCommand),
                orders_query: Arc::new(FixtureOrderQuery),
            })
        },
        |pool| {
            let restaurants = Arc::new(DieselRestaurantRepository::new(pool.clone()));
            let mappings = Arc::new(DieselMappingRepository::new(pool.clone()));
            let handshakes = Arc::new(DieselHandshakeRepository::new(pool.clone()));
            let orders = Arc::new(DieselOrderRepository::new(pool.clone()));
            let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

            let handshake_service = Arc::new(HandshakeService::new(
                handshakes,
                mappings.clone(),
                config.policy.clone(),
                clock.clone(),
            ));
            let kitchen_service = Arc::new(KitchenOrderService::new(orders.clone()));

            HttpState::new(HttpStatePorts {
                registration: Arc::new(RegistrationService::new(
                    restaurants.clone(),
                    clock.clone(),
                )),
                handshake: handshake_service.clone(),
                handshake_query: handshake_service,
                order_relay: Arc::new(OrderRelayService::new(
                    orders,
                    mappings,
                    restaurants,
                    clock,
                )),
                order_status: kitchen_service.clone(),
                orders_query: kitchen_service,
            })
        },
    );
    web::Data::new(state)
}

//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the relay's REST API. It registers:
//!
//! - **Paths**: registration, handshake, order, and health endpoints
//! - **Schemas**: domain type wrappers ([`ErrorSchema`], [`ErrorCodeSchema`])
//!   that provide OpenAPI definitions without coupling domain types to the
//!   utoipa framework
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use utoipa::OpenApi;

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::inbound::http::registration::register_restaurant,
        crate::inbound::http::handshake::submit_handshake,
        crate::inbound::http::handshake::list_pending_handshakes,
        crate::inbound::http::handshake::respond_handshake,
        crate::inbound::http::orders::receive_order,
        crate::inbound::http::orders::list_orders,
        crate::inbound::http::orders::update_order_status,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema)),
    tags(
        (name = "registration", description = "Restaurant onboarding"),
        (name = "handshake", description = "Website-to-kitchen mapping lifecycle"),
        (name = "orders", description = "Order relay and kitchen board"),
        (name = "health", description = "Probes for orchestration")
    ),
    info(
        title = "Kitchen Order Relay API",
        description = "Registration, handshake, and idempotent order relay between ordering websites and kitchen apps."
    )
)]
pub struct ApiDoc;

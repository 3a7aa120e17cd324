//! Domain primitives, aggregates, and services for the order relay.
//!
//! Purpose: define the strongly typed entities the relay protocol is built
//! from (restaurants, mappings, handshake requests, orders), the ports the
//! services drive and are driven by, and the services themselves. Types are
//! immutable; invariants and serialisation contracts live in each type's
//! Rustdoc.

pub mod error;
pub mod ports;

mod callback_url;
mod handshake;
mod handshake_service;
mod idempotency;
mod mapping;
mod order;
mod order_relay_service;
mod registration_service;
mod restaurant;
mod trace_id;

pub use self::callback_url::{CallbackUrl, CallbackUrlValidationError};
pub use self::error::{Error, ErrorCode};
pub use self::handshake::{
    HandshakeDraft, HandshakeRequest, HandshakeStatus, ParseHandshakeStatusError, RequesterInfo,
};
pub use self::handshake_service::{HandshakePolicy, HandshakeService};
pub use self::idempotency::{
    IdempotencyKey, IdempotencyKeyValidationError, PayloadHash, PayloadHashError,
    canonicalize_and_hash,
};
pub use self::mapping::RestaurantMapping;
pub use self::order::{
    Currency, CurrencyValidationError, Customer, Money, MoneyValidationError, Order, OrderDraft,
    OrderItem, OrderStatus, ParseOrderStatusError,
};
pub use self::order_relay_service::{KitchenOrderService, OrderRelayService};
pub use self::registration_service::RegistrationService;
pub use self::restaurant::{
    RegisteredRestaurant, RegistrationDraft, RegistrationDraftValidationError, RestaurantUid,
    WebsiteRestaurantId, WebsiteRestaurantIdValidationError,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

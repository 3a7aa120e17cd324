//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod handshake_command;
mod handshake_repository;
mod mapping_repository;
mod order_relay;
mod order_repository;
mod registration;
mod restaurant_repository;

#[cfg(test)]
pub use handshake_command::{MockHandshakeCommand, MockHandshakeQuery};
pub use handshake_command::{
    FixtureHandshakeCommand, FixtureHandshakeQuery, HandshakeCommand, HandshakeQuery,
    ListPendingHandshakesRequest, ListPendingHandshakesResponse, PendingHandshake,
    RespondHandshakeRequest, RespondHandshakeResponse, SubmitHandshakeRequest,
    SubmitHandshakeResponse,
};
#[cfg(test)]
pub use handshake_repository::MockHandshakeRepository;
pub use handshake_repository::{
    FixtureHandshakeRepository, HandshakeRepository, HandshakeRepositoryError,
};
#[cfg(test)]
pub use mapping_repository::MockMappingRepository;
pub use mapping_repository::{
    FixtureMappingRepository, MappingRepository, MappingRepositoryError,
};
#[cfg(test)]
pub use order_relay::{MockOrderQuery, MockOrderRelayCommand, MockOrderStatusCommand};
pub use order_relay::{
    FixtureOrderQuery, FixtureOrderRelayCommand, FixtureOrderStatusCommand, ListOrdersRequest,
    ListOrdersResponse, OrderQuery, OrderReceipt, OrderRelayCommand, OrderStatusCommand,
    ReceiveOrderOutcome, ReceiveOrderRequest, UpdateOrderStatusRequest,
    UpdateOrderStatusResponse,
};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{FixtureOrderRepository, OrderRepository, OrderRepositoryError};
#[cfg(test)]
pub use registration::MockRegistrationCommand;
pub use registration::{
    FixtureRegistrationCommand, RegisterRestaurantRequest, RegisterRestaurantResponse,
    RegistrationCommand,
};
#[cfg(test)]
pub use restaurant_repository::MockRestaurantRepository;
pub use restaurant_repository::{
    FixtureRestaurantRepository, RestaurantRepository, RestaurantRepositoryError,
};

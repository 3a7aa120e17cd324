//! Port for registered restaurant persistence.

use async_trait::async_trait;

use crate::domain::{RegisteredRestaurant, RestaurantUid};

use super::define_port_error;

define_port_error! {
    /// Errors raised by restaurant repository adapters.
    pub enum RestaurantRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "restaurant repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "restaurant repository query failed: {message}",
    }
}

/// Port for writing registrations and reading restaurant records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    /// Persist a registration.
    ///
    /// Any prior active registration for the same website restaurant id is
    /// deactivated in the same transaction, so the newest registration is
    /// the active one.
    async fn register(
        &self,
        restaurant: &RegisteredRestaurant,
    ) -> Result<(), RestaurantRepositoryError>;

    /// Find a restaurant by its relay-issued uid.
    async fn find_by_uid(
        &self,
        uid: &RestaurantUid,
    ) -> Result<Option<RegisteredRestaurant>, RestaurantRepositoryError>;

    /// Read all registrations, newest first. Used by admin reporting.
    async fn list(&self) -> Result<Vec<RegisteredRestaurant>, RestaurantRepositoryError>;
}

/// Fixture implementation for tests that do not exercise registration
/// persistence. Accepts writes and reports an empty store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRestaurantRepository;

#[async_trait]
impl RestaurantRepository for FixtureRestaurantRepository {
    async fn register(
        &self,
        _restaurant: &RegisteredRestaurant,
    ) -> Result<(), RestaurantRepositoryError> {
        Ok(())
    }

    async fn find_by_uid(
        &self,
        _uid: &RestaurantUid,
    ) -> Result<Option<RegisteredRestaurant>, RestaurantRepositoryError> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<RegisteredRestaurant>, RestaurantRepositoryError> {
        Ok(Vec::new())
    }
}

//! Port for website-to-restaurant mapping persistence.

use async_trait::async_trait;

use crate::domain::{RestaurantMapping, RestaurantUid, WebsiteRestaurantId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by mapping repository adapters.
    pub enum MappingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "mapping repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "mapping repository query failed: {message}",
    }
}

/// Port for resolving and activating restaurant mappings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MappingRepository: Send + Sync {
    /// Find the active mapping for a website restaurant id, if any.
    ///
    /// With the at-most-one-active invariant in place this resolves
    /// unambiguously; adapters return the most recently handshaken row
    /// should legacy data violate it.
    async fn find_active_by_website_id(
        &self,
        website_restaurant_id: &WebsiteRestaurantId,
    ) -> Result<Option<RestaurantMapping>, MappingRepositoryError>;

    /// Find an active mapping matching both identifiers.
    ///
    /// Used to verify caller-asserted uids: a bare uid without a live
    /// mapping must not route orders.
    async fn find_active_pair(
        &self,
        website_restaurant_id: &WebsiteRestaurantId,
        restaurant_uid: &RestaurantUid,
    ) -> Result<Option<RestaurantMapping>, MappingRepositoryError>;

    /// Activate a mapping, superseding the previous one.
    ///
    /// Deactivates any existing active mapping for the same website
    /// restaurant id and inserts the new row in a single transaction,
    /// preserving the at-most-one-active invariant under concurrency.
    async fn activate(&self, mapping: &RestaurantMapping) -> Result<(), MappingRepositoryError>;

    /// Read all active mappings. Used by admin reporting.
    async fn list_active(&self) -> Result<Vec<RestaurantMapping>, MappingRepositoryError>;
}

/// Fixture implementation for tests that do not exercise mapping
/// persistence. Resolves nothing and accepts activations.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMappingRepository;

#[async_trait]
impl MappingRepository for FixtureMappingRepository {
    async fn find_active_by_website_id(
        &self,
        _website_restaurant_id: &WebsiteRestaurantId,
    ) -> Result<Option<RestaurantMapping>, MappingRepositoryError> {
        Ok(None)
    }

    async fn find_active_pair(
        &self,
        _website_restaurant_id: &WebsiteRestaurantId,
        _restaurant_uid: &RestaurantUid,
    ) -> Result<Option<RestaurantMapping>, MappingRepositoryError> {
        Ok(None)
    }

    async fn activate(&self, _mapping: &RestaurantMapping) -> Result<(), MappingRepositoryError> {
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<RestaurantMapping>, MappingRepositoryError> {
        Ok(Vec::new())
    }
}

//! Driving port for restaurant registration.

use async_trait::async_trait;

use crate::domain::{Error, RegistrationDraft, RestaurantUid, WebsiteRestaurantId};

/// Request payload for onboarding a restaurant.
#[derive(Debug, Clone)]
pub struct RegisterRestaurantRequest {
    /// Validated registration fields.
    pub draft: RegistrationDraft,
}

/// Response returned to the website after registration.
///
/// The uid must be treated as a capability token for subsequent order
/// submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRestaurantResponse {
    /// Relay-issued stable identifier.
    pub restaurant_uid: RestaurantUid,
    /// Echo of the website's identifier.
    pub website_restaurant_id: WebsiteRestaurantId,
    /// Echo of the registered display name.
    pub restaurant_name: String,
}

/// Use-case port: onboard a restaurant and issue its uid.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationCommand: Send + Sync {
    /// Register the restaurant described by the request.
    async fn register(
        &self,
        request: RegisterRestaurantRequest,
    ) -> Result<RegisterRestaurantResponse, Error>;
}

/// Fixture implementation issuing a fresh uid without persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRegistrationCommand;

#[async_trait]
impl RegistrationCommand for FixtureRegistrationCommand {
    async fn register(
        &self,
        request: RegisterRestaurantRequest,
    ) -> Result<RegisterRestaurantResponse, Error> {
        Ok(RegisterRestaurantResponse {
            restaurant_uid: RestaurantUid::generate(),
            website_restaurant_id: request.draft.website_restaurant_id,
            restaurant_name: request.draft.name,
        })
    }
}

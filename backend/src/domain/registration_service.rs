//! Restaurant registration domain service.
//!
//! Issues the relay-side uid and persists the registration. The uid is a
//! fresh UUID v4 on every call, never derived from caller input, so it
//! cannot be predicted or spoofed by a website.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    RegisterRestaurantRequest, RegisterRestaurantResponse, RegistrationCommand,
    RestaurantRepository, RestaurantRepositoryError,
};
use crate::domain::{Error, RegisteredRestaurant, RestaurantUid};

fn map_repository_error(error: RestaurantRepositoryError) -> Error {
    match error {
        RestaurantRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("restaurant repository unavailable: {message}"))
        }
        RestaurantRepositoryError::Query { message } => {
            Error::internal(format!("restaurant repository error: {message}"))
        }
    }
}

/// Registration service implementing the [`RegistrationCommand`] port.
#[derive(Clone)]
pub struct RegistrationService<R> {
    restaurants: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> RegistrationService<R> {
    /// Create a new registration service.
    pub fn new(restaurants: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { restaurants, clock }
    }
}

#[async_trait]
impl<R> RegistrationCommand for RegistrationService<R>
where
    R: RestaurantRepository,
{
    async fn register(
        &self,
        request: RegisterRestaurantRequest,
    ) -> Result<RegisterRestaurantResponse, Error> {
        let uid = RestaurantUid::generate();
        let restaurant =
            RegisteredRestaurant::from_draft(uid, request.draft, self.clock.utc()).map_err(
                |err| {
                    Error::invalid_request(err.to_string())
                        .with_details(json!({ "field": err.field }))
                },
            )?;

        self.restaurants
            .register(&restaurant)
            .await
            .map_err(map_repository_error)?;

        info!(
            restaurant_uid = %restaurant.uid,
            website_restaurant_id = %restaurant.website_restaurant_id,
            "restaurant registered"
        );

        Ok(RegisterRestaurantResponse {
            restaurant_uid: restaurant.uid,
            website_restaurant_id: restaurant.website_restaurant_id,
            restaurant_name: restaurant.name,
        })
    }
}

#[cfg(test)]
#[path = "registration_service_tests.rs"]
mod tests;

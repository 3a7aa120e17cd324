//! Restaurant registration HTTP handler.
//!
//! ```text
//! POST /api/v1/register
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::RegistrationDraft;
use crate::domain::ports::{RegisterRestaurantRequest, RegisterRestaurantResponse};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_callback_url, parse_website_restaurant_id, require_field,
};

/// Request payload for registering a restaurant.
///
/// Every field is required; they are optional here so a missing one
/// produces a validation error naming the field instead of a bare
/// deserialisation failure.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequestBody {
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: Option<String>,
    /// Restaurant display name.
    pub restaurant_name: Option<String>,
    /// Contact phone number.
    pub restaurant_phone: Option<String>,
    /// Contact email address.
    pub restaurant_email: Option<String>,
    /// Street address.
    pub restaurant_address: Option<String>,
    /// Absolute http(s) callback endpoint.
    pub callback_url: Option<String>,
}

/// Response payload after a successful registration.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterResponseBody {
    /// Always `true` on this arm; errors use the shared envelope.
    pub success: bool,
    /// Relay-issued identifier; the website must treat it as a capability
    /// token for order submission.
    #[schema(format = "uuid")]
    pub app_restaurant_uid: String,
    /// Echo of the website's identifier.
    pub website_restaurant_id: String,
    /// Echo of the registered display name.
    pub restaurant_name: String,
}

impl From<RegisterRestaurantResponse> for RegisterResponseBody {
    fn from(value: RegisterRestaurantResponse) -> Self {
        Self {
            success: true,
            app_restaurant_uid: value.restaurant_uid.to_string(),
            website_restaurant_id: value.website_restaurant_id.to_string(),
            restaurant_name: value.restaurant_name,
        }
    }
}

fn parse_registration(body: RegisterRequestBody) -> Result<RegistrationDraft, crate::domain::Error> {
    let website_restaurant_id = require_field(
        body.website_restaurant_id,
        FieldName::new("website_restaurant_id"),
    )?;
    let website_restaurant_id = parse_website_restaurant_id(
        website_restaurant_id,
        FieldName::new("website_restaurant_id"),
    )?;
    let name = require_field(body.restaurant_name, FieldName::new("restaurant_name"))?;
    let phone = require_field(body.restaurant_phone, FieldName::new("restaurant_phone"))?;
    let email = require_field(body.restaurant_email, FieldName::new("restaurant_email"))?;
    let address = require_field(
        body.restaurant_address,
        FieldName::new("restaurant_address"),
    )?;
    let callback_url = require_field(body.callback_url, FieldName::new("callback_url"))?;
    let callback_url = parse_callback_url(&callback_url, FieldName::new("callback_url"))?;

    Ok(RegistrationDraft {
        website_restaurant_id,
        name,
        phone,
        email,
        address,
        callback_url,
    })
}

/// Onboard a restaurant and issue its stable relay identifier.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequestBody,
    responses(
        (status = 200, description = "Restaurant registered", body = RegisterResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["registration"],
    operation_id = "registerRestaurant"
)]
#[post("/register")]
pub async fn register_restaurant(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequestBody>,
) -> ApiResult<web::Json<RegisterResponseBody>> {
    let draft = parse_registration(payload.into_inner())?;

    let response = state
        .registration
        .register(RegisterRestaurantRequest { draft })
        .await?;

    Ok(web::Json(RegisterResponseBody::from(response)))
}

#[cfg(test)]
#[path = "registration_tests.rs"]
mod tests;

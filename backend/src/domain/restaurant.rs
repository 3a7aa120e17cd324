//! Restaurant identity and registration aggregate.
//!
//! A restaurant carries two identifiers: the website's own
//! [`WebsiteRestaurantId`] (opaque to the relay aside from mapping lookup)
//! and the relay-issued [`RestaurantUid`], a random UUID generated at
//! registration and never derived from caller input.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::CallbackUrl;

/// Stable internal restaurant identifier issued at registration.
///
/// The kitchen app filters orders by this value, so it must be treated as a
/// capability token by the website. It is always generated server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantUid(Uuid);

impl RestaurantUid {
    /// Issue a fresh identifier (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID, e.g. one loaded from the database.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RestaurantUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RestaurantUid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Identifier the external website assigned to a restaurant.
///
/// Opaque to the relay: any non-empty trimmed string is accepted and only
/// ever compared for equality during mapping lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WebsiteRestaurantId(String);

/// Validation errors for [`WebsiteRestaurantId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebsiteRestaurantIdValidationError {
    /// The identifier was empty or whitespace-only.
    #[error("website restaurant id must not be empty")]
    Empty,
    /// The identifier had surrounding whitespace.
    #[error("website restaurant id must not have surrounding whitespace")]
    Untrimmed,
}

impl WebsiteRestaurantId {
    /// Validate and construct an identifier.
    ///
    /// # Errors
    ///
    /// Rejects empty and untrimmed values.
    pub fn new(raw: impl Into<String>) -> Result<Self, WebsiteRestaurantIdValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(WebsiteRestaurantIdValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(WebsiteRestaurantIdValidationError::Untrimmed);
        }
        Ok(Self(raw))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for WebsiteRestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<WebsiteRestaurantId> for String {
    fn from(value: WebsiteRestaurantId) -> Self {
        value.0
    }
}

impl TryFrom<String> for WebsiteRestaurantId {
    type Error = WebsiteRestaurantIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Display metadata and callback endpoint submitted by the website when
/// onboarding a restaurant. Field presence is validated in the inbound
/// adapter so the error can name the missing field; the draft re-checks the
/// basics so the domain cannot be constructed in an invalid state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDraft {
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: WebsiteRestaurantId,
    /// Restaurant display name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Contact email address.
    pub email: String,
    /// Street address shown on receipts.
    pub address: String,
    /// Website callback endpoint.
    pub callback_url: CallbackUrl,
}

/// Validation errors for [`RegistrationDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("registration field {field} must not be empty")]
pub struct RegistrationDraftValidationError {
    /// Name of the blank field.
    pub field: &'static str,
}

impl RegistrationDraft {
    /// Check that no display field is blank.
    ///
    /// # Errors
    ///
    /// Returns the first blank field by name.
    pub fn validate(&self) -> Result<(), RegistrationDraftValidationError> {
        for (field, value) in [
            ("restaurant_name", self.name.as_str()),
            ("restaurant_phone", self.phone.as_str()),
            ("restaurant_email", self.email.as_str()),
            ("restaurant_address", self.address.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(RegistrationDraftValidationError { field });
            }
        }
        Ok(())
    }
}

/// One onboarded restaurant.
///
/// Created by the registration service; deactivated (never hard-deleted)
/// when the restaurant is removed or re-registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRestaurant {
    /// Relay-issued stable identifier.
    pub uid: RestaurantUid,
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: WebsiteRestaurantId,
    /// Restaurant display name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Contact email address.
    pub email: String,
    /// Street address shown on receipts.
    pub address: String,
    /// Website callback endpoint.
    pub callback_url: CallbackUrl,
    /// Whether the registration is live. Soft-delete flag.
    pub is_active: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RegisteredRestaurant {
    /// Build an active restaurant from a validated draft.
    ///
    /// # Errors
    ///
    /// Propagates draft validation failures.
    pub fn from_draft(
        uid: RestaurantUid,
        draft: RegistrationDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, RegistrationDraftValidationError> {
        draft.validate()?;
        let RegistrationDraft {
            website_restaurant_id,
            name,
            phone,
            email,
            address,
            callback_url,
        } = draft;
        Ok(Self {
            uid,
            website_restaurant_id,
            name,
            phone,
            email,
            address,
            callback_url,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

//! Active binding between a website restaurant id and a relay uid.
//!
//! Order relay resolves inbound orders through this record, so the system
//! maintains at most one active mapping per website restaurant id. Activating
//! a new mapping supersedes (deactivates) the previous one in the same
//! transaction; the persistence layer additionally enforces the invariant
//! with a partial unique index.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{CallbackUrl, RestaurantUid, WebsiteRestaurantId};

/// Binding record used to resolve inbound orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantMapping {
    /// Row identifier.
    pub id: Uuid,
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: WebsiteRestaurantId,
    /// Relay-issued restaurant identifier the mapping resolves to.
    pub restaurant_uid: RestaurantUid,
    /// Callback endpoint captured when the mapping was established.
    pub callback_url: CallbackUrl,
    /// Whether this row is the live binding.
    pub is_active: bool,
    /// Handshake request that produced this mapping, when one did.
    /// Backfilled mappings for manually onboarded restaurants carry `None`.
    pub handshake_request_id: Option<Uuid>,
    /// When the binding was last confirmed by a handshake.
    pub last_handshake_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl RestaurantMapping {
    /// Build a fresh active mapping established at `now`.
    #[must_use]
    pub fn establish(
        website_restaurant_id: WebsiteRestaurantId,
        restaurant_uid: RestaurantUid,
        callback_url: CallbackUrl,
        handshake_request_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            website_restaurant_id,
            restaurant_uid,
            callback_url,
            is_active: true,
            handshake_request_id,
            last_handshake_at: now,
            created_at: now,
        }
    }
}

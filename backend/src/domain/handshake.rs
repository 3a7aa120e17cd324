//! Handshake request lifecycle.
//!
//! One row per attempt by a website to establish or refresh its mapping.
//! The state machine is `pending → completed | rejected`, with `expired` as
//! an implicit terminal state: any read of a pending row past `expires_at`
//! must treat it as expired without waiting for a background sweep. Rows are
//! never mutated after reaching a terminal state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CallbackUrl, RestaurantUid, WebsiteRestaurantId};

/// Lifecycle state of a handshake request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeStatus {
    /// Awaiting a kitchen response.
    Pending,
    /// A kitchen accepted and the mapping was activated.
    Completed,
    /// The deadline passed without a response.
    Expired,
    /// A kitchen declined the request.
    Rejected,
}

impl HandshakeStatus {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the state admits no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for HandshakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse error for [`HandshakeStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown handshake status: {value}")]
pub struct ParseHandshakeStatusError {
    /// The unrecognised value.
    pub value: String,
}

impl FromStr for HandshakeStatus {
    type Err = ParseHandshakeStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseHandshakeStatusError {
                value: other.to_owned(),
            }),
        }
    }
}

/// Network identity of the party submitting a handshake, recorded for rate
/// limiting and audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterInfo {
    /// Peer or forwarded-for address as reported by the HTTP layer.
    pub ip: String,
    /// `User-Agent` header, when present.
    pub user_agent: Option<String>,
}

/// One attempt by a website to establish or refresh its mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    /// Row identifier, returned to the caller for polling.
    pub id: Uuid,
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: WebsiteRestaurantId,
    /// Callback endpoint to confirm against.
    pub callback_url: CallbackUrl,
    /// Domain of the requesting website; derived from the callback host
    /// when not supplied explicitly.
    pub website_domain: String,
    /// Stored lifecycle state. Use [`Self::effective_status`] when reading:
    /// a stored `pending` past the deadline is already expired.
    pub status: HandshakeStatus,
    /// Kitchen the request is directed at, or `None` for a broadcast.
    pub target_restaurant_uid: Option<RestaurantUid>,
    /// Submitting party, for rate limiting and audit.
    pub requester: RequesterInfo,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Response deadline.
    pub expires_at: DateTime<Utc>,
    /// When a kitchen responded, for completed/rejected rows.
    pub responded_at: Option<DateTime<Utc>>,
}

/// Input for opening a new handshake request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeDraft {
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: WebsiteRestaurantId,
    /// Callback endpoint to confirm against.
    pub callback_url: CallbackUrl,
    /// Explicit domain override; defaults to the callback host.
    pub website_domain: Option<String>,
    /// Kitchen the request is directed at, or `None` for a broadcast.
    pub target_restaurant_uid: Option<RestaurantUid>,
    /// Submitting party.
    pub requester: RequesterInfo,
}

impl HandshakeRequest {
    /// Open a pending request expiring `ttl` after `now`.
    #[must_use]
    pub fn open(draft: HandshakeDraft, now: DateTime<Utc>, ttl: Duration) -> Self {
        let HandshakeDraft {
            website_restaurant_id,
            callback_url,
            website_domain,
            target_restaurant_uid,
            requester,
        } = draft;
        let website_domain =
            website_domain.unwrap_or_else(|| callback_url.host().to_owned());
        Self {
            id: Uuid::new_v4(),
            website_restaurant_id,
            callback_url,
            website_domain,
            status: HandshakeStatus::Pending,
            target_restaurant_uid,
            requester,
            created_at: now,
            expires_at: now + ttl,
            responded_at: None,
        }
    }

    /// Whether the response deadline has passed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The authoritative state at `now`: a stored `pending` past its
    /// deadline reads as `expired` regardless of the column value.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> HandshakeStatus {
        if self.status == HandshakeStatus::Pending && self.is_expired(now) {
            HandshakeStatus::Expired
        } else {
            self.status
        }
    }

    /// Whether this request would be delivered to the given kitchen:
    /// either targeted at it or broadcast to all.
    #[must_use]
    pub fn addresses(&self, uid: &RestaurantUid) -> bool {
        self.target_restaurant_uid
            .as_ref()
            .is_none_or(|target| target == uid)
    }
}

//! Driving ports for the handshake lifecycle.
//!
//! Websites submit handshakes; kitchens poll for pending requests and
//! respond, which is what ultimately activates a mapping.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Error, HandshakeDraft, HandshakeRequest, HandshakeStatus, RestaurantUid,
};

/// Request payload for submitting a handshake.
#[derive(Debug, Clone)]
pub struct SubmitHandshakeRequest {
    /// Validated handshake fields plus requester identity.
    pub draft: HandshakeDraft,
}

/// Response returned to the website after a handshake was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitHandshakeResponse {
    /// Identifier the website polls with.
    pub handshake_request_id: Uuid,
    /// Human-readable delivery note; distinguishes targeted from broadcast
    /// delivery.
    pub message: String,
    /// Rough guidance for the caller's polling cadence.
    pub estimated_response_time: String,
    /// The kitchen the request was directed at, when one resolved.
    pub target_restaurant_uid: Option<RestaurantUid>,
}

/// Request payload for a kitchen responding to a handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondHandshakeRequest {
    /// The handshake being answered.
    pub handshake_request_id: Uuid,
    /// The responding kitchen.
    pub restaurant_uid: RestaurantUid,
    /// `true` accepts and activates the mapping; `false` rejects.
    pub accept: bool,
}

/// Response after a kitchen answered a handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondHandshakeResponse {
    /// Terminal state the request moved to.
    pub status: HandshakeStatus,
    /// The mapping activated on acceptance.
    pub mapping_id: Option<Uuid>,
}

/// Use-case port: website-side handshake submission and kitchen-side
/// response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HandshakeCommand: Send + Sync {
    /// Open a handshake request for a website restaurant id.
    async fn submit(
        &self,
        request: SubmitHandshakeRequest,
    ) -> Result<SubmitHandshakeResponse, Error>;

    /// Answer a pending handshake, activating the mapping on acceptance.
    async fn respond(
        &self,
        request: RespondHandshakeRequest,
    ) -> Result<RespondHandshakeResponse, Error>;
}

/// Serializable projection of a pending handshake for kitchen polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHandshake {
    /// Request identifier.
    pub id: Uuid,
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: String,
    /// Requesting website domain.
    pub website_domain: String,
    /// Callback endpoint to confirm against.
    pub callback_url: String,
    /// Whether the request was directed at this kitchen specifically.
    pub targeted: bool,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Response deadline.
    pub expires_at: DateTime<Utc>,
}

impl PendingHandshake {
    /// Project a request for delivery to `uid`.
    #[must_use]
    pub fn for_restaurant(request: &HandshakeRequest, uid: &RestaurantUid) -> Self {
        Self {
            id: request.id,
            website_restaurant_id: request.website_restaurant_id.to_string(),
            website_domain: request.website_domain.clone(),
            callback_url: request.callback_url.to_string(),
            targeted: request.target_restaurant_uid.as_ref() == Some(uid),
            created_at: request.created_at,
            expires_at: request.expires_at,
        }
    }
}

/// Request payload for kitchen polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPendingHandshakesRequest {
    /// The polling kitchen.
    pub restaurant_uid: RestaurantUid,
}

/// Pending handshakes awaiting this kitchen's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPendingHandshakesResponse {
    /// Unexpired pending requests, oldest first.
    pub requests: Vec<PendingHandshake>,
}

/// Use-case port: kitchen-side handshake polling.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HandshakeQuery: Send + Sync {
    /// Pending, unexpired handshakes addressed to the kitchen.
    async fn list_pending(
        &self,
        request: ListPendingHandshakesRequest,
    ) -> Result<ListPendingHandshakesResponse, Error>;
}

/// Fixture implementation acknowledging submissions without persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureHandshakeCommand;

#[async_trait]
impl HandshakeCommand for FixtureHandshakeCommand {
    async fn submit(
        &self,
        request: SubmitHandshakeRequest,
    ) -> Result<SubmitHandshakeResponse, Error> {
        let target_restaurant_uid = request.draft.target_restaurant_uid;
        Ok(SubmitHandshakeResponse {
            handshake_request_id: Uuid::new_v4(),
            message: "Handshake request broadcast to all available restaurants".to_owned(),
            estimated_response_time: "2-5 minutes".to_owned(),
            target_restaurant_uid,
        })
    }

    async fn respond(
        &self,
        request: RespondHandshakeRequest,
    ) -> Result<RespondHandshakeResponse, Error> {
        Ok(RespondHandshakeResponse {
            status: if request.accept {
                HandshakeStatus::Completed
            } else {
                HandshakeStatus::Rejected
            },
            mapping_id: request.accept.then(Uuid::new_v4),
        })
    }
}

/// Fixture implementation reporting no pending handshakes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureHandshakeQuery;

#[async_trait]
impl HandshakeQuery for FixtureHandshakeQuery {
    async fn list_pending(
        &self,
        _request: ListPendingHandshakesRequest,
    ) -> Result<ListPendingHandshakesResponse, Error> {
        Ok(ListPendingHandshakesResponse {
            requests: Vec::new(),
        })
    }
}

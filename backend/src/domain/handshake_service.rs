//! Handshake lifecycle domain service.
//!
//! Implements the website-facing submission flow (rate limit, duplicate
//! pending rejection, target resolution, deadline assignment) and the
//! kitchen-facing response flow that activates mappings. All time
//! comparisons run against an injected clock so expiry is testable and the
//! lazy terminal-state check stays authoritative.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    HandshakeCommand, HandshakeQuery, HandshakeRepository, HandshakeRepositoryError,
    ListPendingHandshakesRequest, ListPendingHandshakesResponse, MappingRepository,
    MappingRepositoryError, PendingHandshake, RespondHandshakeRequest, RespondHandshakeResponse,
    SubmitHandshakeRequest, SubmitHandshakeResponse,
};
use crate::domain::{
    Error, HandshakeRequest, HandshakeStatus, RestaurantMapping,
};

/// Guidance returned to callers on how long a kitchen usually takes to
/// answer.
const ESTIMATED_RESPONSE_TIME: &str = "2-5 minutes";

/// Tunable limits for the handshake flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakePolicy {
    /// How long a request stays answerable.
    pub request_ttl: Duration,
    /// Requests allowed per address within the window.
    pub rate_limit_max_requests: u64,
    /// Trailing window the per-address count is taken over.
    pub rate_limit_window: Duration,
}

impl Default for HandshakePolicy {
    fn default() -> Self {
        Self {
            request_ttl: Duration::minutes(10),
            rate_limit_max_requests: 10,
            rate_limit_window: Duration::minutes(60),
        }
    }
}

impl HandshakePolicy {
    /// The `Retry-After` value handed to rate-limited callers.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        u64::try_from(self.rate_limit_window.num_seconds()).unwrap_or(0)
    }
}

fn map_handshake_error(error: HandshakeRepositoryError) -> Error {
    match error {
        HandshakeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("handshake repository unavailable: {message}"))
        }
        HandshakeRepositoryError::Query { message } => {
            Error::internal(format!("handshake repository error: {message}"))
        }
        HandshakeRepositoryError::DuplicatePending { message } => {
            Error::conflict(format!("pending handshake already exists: {message}"))
        }
    }
}

fn map_mapping_error(error: MappingRepositoryError) -> Error {
    match error {
        MappingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("mapping repository unavailable: {message}"))
        }
        MappingRepositoryError::Query { message } => {
            Error::internal(format!("mapping repository error: {message}"))
        }
    }
}

fn pending_conflict(existing: &HandshakeRequest) -> Error {
    Error::conflict(
        "a handshake request is already pending for this website restaurant id",
    )
    .with_details(json!({
        "handshake_request_id": existing.id,
        "expires_at": existing.expires_at.to_rfc3339(),
    }))
}

/// Handshake service implementing the command and query driving ports.
#[derive(Clone)]
pub struct HandshakeService<H, M> {
    handshakes: Arc<H>,
    mappings: Arc<M>,
    policy: HandshakePolicy,
    clock: Arc<dyn Clock>,
}

impl<H, M> HandshakeService<H, M> {
    /// Create a new handshake service.
    pub fn new(
        handshakes: Arc<H>,
        mappings: Arc<M>,
        policy: HandshakePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            handshakes,
            mappings,
            policy,
            clock,
        }
    }
}

impl<H, M> HandshakeService<H, M>
where
    H: HandshakeRepository,
    M: MappingRepository,
{
    async fn enforce_rate_limit(&self, requester_ip: &str) -> Result<(), Error> {
        let since = self.clock.utc() - self.policy.rate_limit_window;
        let recent = self
            .handshakes
            .count_since_for_ip(requester_ip, since)
            .await
            .map_err(map_handshake_error)?;

        if recent >= self.policy.rate_limit_max_requests {
            let retry_after = self.policy.retry_after_secs();
            warn!(requester_ip, recent, "handshake rate limit hit");
            return Err(Error::rate_limited(
                "too many handshake requests from this address",
            )
            .with_retry_after(retry_after)
            .with_details(json!({
                "max_requests": self.policy.rate_limit_max_requests,
                "window_secs": retry_after,
            })));
        }
        Ok(())
    }

    /// Retire a pending row that outlived its deadline. Failure is logged
    /// and ignored: the read-side expiry check stays authoritative.
    async fn retire_expired(&self, existing: &HandshakeRequest) {
        let moved = self
            .handshakes
            .transition(
                &existing.id,
                HandshakeStatus::Pending,
                HandshakeStatus::Expired,
                None,
            )
            .await;
        match moved {
            Ok(true) => debug!(handshake_request_id = %existing.id, "expired handshake retired"),
            Ok(false) => {}
            Err(err) => {
                warn!(handshake_request_id = %existing.id, error = %err, "failed to retire expired handshake");
            }
        }
    }
}

#[async_trait]
impl<H, M> HandshakeCommand for HandshakeService<H, M>
where
    H: HandshakeRepository,
    M: MappingRepository,
{
    async fn submit(
        &self,
        request: SubmitHandshakeRequest,
    ) -> Result<SubmitHandshakeResponse, Error> {
        let now = self.clock.utc();
        let mut draft = request.draft;

        self.enforce_rate_limit(&draft.requester.ip).await?;

        if let Some(existing) = self
            .handshakes
            .find_pending_by_website_id(&draft.website_restaurant_id)
            .await
            .map_err(map_handshake_error)?
        {
            if existing.is_expired(now) {
                self.retire_expired(&existing).await;
            } else {
                return Err(pending_conflict(&existing));
            }
        }

        if draft.target_restaurant_uid.is_none() {
            draft.target_restaurant_uid = self
                .mappings
                .find_active_by_website_id(&draft.website_restaurant_id)
                .await
                .map_err(map_mapping_error)?
                .map(|mapping| mapping.restaurant_uid);
        }

        let opened = HandshakeRequest::open(draft, now, self.policy.request_ttl);
        match self.handshakes.insert(&opened).await {
            Ok(()) => {}
            Err(HandshakeRepositoryError::DuplicatePending { .. }) => {
                // Lost a race against a concurrent submission; hand the
                // caller the winning request id when it is visible.
                let existing = self
                    .handshakes
                    .find_pending_by_website_id(&opened.website_restaurant_id)
                    .await
                    .map_err(map_handshake_error)?;
                return Err(existing.as_ref().map_or_else(
                    || {
                        Error::conflict(
                            "a handshake request is already pending for this website restaurant id",
                        )
                    },
                    pending_conflict,
                ));
            }
            Err(other) => return Err(map_handshake_error(other)),
        }

        let message = opened.target_restaurant_uid.as_ref().map_or_else(
            || "Handshake request broadcast to all available restaurants".to_owned(),
            |uid| format!("Handshake request sent to restaurant {uid}"),
        );
        info!(
            handshake_request_id = %opened.id,
            website_restaurant_id = %opened.website_restaurant_id,
            targeted = opened.target_restaurant_uid.is_some(),
            "handshake request opened"
        );

        Ok(SubmitHandshakeResponse {
            handshake_request_id: opened.id,
            message,
            estimated_response_time: ESTIMATED_RESPONSE_TIME.to_owned(),
            target_restaurant_uid: opened.target_restaurant_uid,
        })
    }

    async fn respond(
        &self,
        request: RespondHandshakeRequest,
    ) -> Result<RespondHandshakeResponse, Error> {
        let now = self.clock.utc();
        let stored = self
            .handshakes
            .find_by_id(&request.handshake_request_id)
            .await
            .map_err(map_handshake_error)?
            .ok_or_else(|| {
                Error::not_found(format!(
                    "handshake request {} not found",
                    request.handshake_request_id
                ))
            })?;

        match stored.effective_status(now) {
            HandshakeStatus::Pending => {}
            HandshakeStatus::Expired => {
                if stored.status == HandshakeStatus::Pending {
                    self.retire_expired(&stored).await;
                }
                return Err(Error::conflict("handshake request has expired"));
            }
            terminal => {
                return Err(Error::conflict(format!(
                    "handshake request is already {terminal}"
                )));
            }
        }

        if let Some(target) = &stored.target_restaurant_uid {
            if target != &request.restaurant_uid {
                return Err(Error::forbidden(
                    "handshake request is directed at a different restaurant",
                ));
            }
        }

        let next = if request.accept {
            HandshakeStatus::Completed
        } else {
            HandshakeStatus::Rejected
        };
        let moved = self
            .handshakes
            .transition(&stored.id, HandshakeStatus::Pending, next, Some(now))
            .await
            .map_err(map_handshake_error)?;
        if !moved {
            return Err(Error::conflict("handshake request was answered concurrently"));
        }

        if !request.accept {
            info!(handshake_request_id = %stored.id, "handshake rejected");
            return Ok(RespondHandshakeResponse {
                status: HandshakeStatus::Rejected,
                mapping_id: None,
            });
        }

        let mapping = RestaurantMapping::establish(
            stored.website_restaurant_id.clone(),
            request.restaurant_uid,
            stored.callback_url.clone(),
            Some(stored.id),
            now,
        );
        self.mappings
            .activate(&mapping)
            .await
            .map_err(map_mapping_error)?;

        info!(
            handshake_request_id = %stored.id,
            mapping_id = %mapping.id,
            restaurant_uid = %request.restaurant_uid,
            "handshake completed and mapping activated"
        );

        Ok(RespondHandshakeResponse {
            status: HandshakeStatus::Completed,
            mapping_id: Some(mapping.id),
        })
    }
}

#[async_trait]
impl<H, M> HandshakeQuery for HandshakeService<H, M>
where
    H: HandshakeRepository,
    M: MappingRepository,
{
    async fn list_pending(
        &self,
        request: ListPendingHandshakesRequest,
    ) -> Result<ListPendingHandshakesResponse, Error> {
        let now = self.clock.utc();
        let rows = self
            .handshakes
            .list_pending_for_restaurant(&request.restaurant_uid)
            .await
            .map_err(map_handshake_error)?;

        let requests = rows
            .iter()
            .filter(|row| !row.is_expired(now))
            .map(|row| PendingHandshake::for_restaurant(row, &request.restaurant_uid))
            .collect();

        Ok(ListPendingHandshakesResponse { requests })
    }
}

#[cfg(test)]
#[path = "handshake_service_tests.rs"]
mod tests;

//! Port for handshake request persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{HandshakeRequest, HandshakeStatus, RestaurantUid, WebsiteRestaurantId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by handshake repository adapters.
    pub enum HandshakeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "handshake repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "handshake repository query failed: {message}",
        /// A pending request already exists for the website restaurant id
        /// (concurrent insert raced the partial unique index).
        DuplicatePending { message: String } =>
            "pending handshake already exists: {message}",
    }
}

/// Port for handshake request storage, polling, and state transitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HandshakeRepository: Send + Sync {
    /// Persist a freshly opened request.
    ///
    /// Returns [`HandshakeRepositoryError::DuplicatePending`] when another
    /// pending row for the same website restaurant id exists.
    async fn insert(&self, request: &HandshakeRequest) -> Result<(), HandshakeRepositoryError>;

    /// Find a request by id.
    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<HandshakeRequest>, HandshakeRepositoryError>;

    /// Find the stored-pending request for a website restaurant id, if any.
    ///
    /// Expiry is not evaluated here; callers judge staleness against their
    /// clock so the terminal-state check stays lazy and authoritative.
    async fn find_pending_by_website_id(
        &self,
        website_restaurant_id: &WebsiteRestaurantId,
    ) -> Result<Option<HandshakeRequest>, HandshakeRepositoryError>;

    /// Count requests submitted by an address since the given instant.
    /// Feeds the per-IP rate limit.
    async fn count_since_for_ip(
        &self,
        requester_ip: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, HandshakeRepositoryError>;

    /// Stored-pending requests a kitchen should see: targeted at it or
    /// broadcast. Expiry is judged by the caller.
    async fn list_pending_for_restaurant(
        &self,
        restaurant_uid: &RestaurantUid,
    ) -> Result<Vec<HandshakeRequest>, HandshakeRepositoryError>;

    /// Conditionally move a request from `from` to `to`.
    ///
    /// Returns `false` when no row matched, i.e. the request was not in
    /// `from` any more; terminal states are therefore never overwritten.
    async fn transition(
        &self,
        id: &Uuid,
        from: HandshakeStatus,
        to: HandshakeStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> Result<bool, HandshakeRepositoryError>;
}

/// Fixture implementation for tests that do not exercise handshake
/// persistence. Stores nothing and reports an empty table.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureHandshakeRepository;

#[async_trait]
impl HandshakeRepository for FixtureHandshakeRepository {
    async fn insert(&self, _request: &HandshakeRequest) -> Result<(), HandshakeRepositoryError> {
        Ok(())
    }

    async fn find_by_id(
        &self,
        _id: &Uuid,
    ) -> Result<Option<HandshakeRequest>, HandshakeRepositoryError> {
        Ok(None)
    }

    async fn find_pending_by_website_id(
        &self,
        _website_restaurant_id: &WebsiteRestaurantId,
    ) -> Result<Option<HandshakeRequest>, HandshakeRepositoryError> {
        Ok(None)
    }

    async fn count_since_for_ip(
        &self,
        _requester_ip: &str,
        _since: DateTime<Utc>,
    ) -> Result<u64, HandshakeRepositoryError> {
        Ok(0)
    }

    async fn list_pending_for_restaurant(
        &self,
        _restaurant_uid: &RestaurantUid,
    ) -> Result<Vec<HandshakeRequest>, HandshakeRepositoryError> {
        Ok(Vec::new())
    }

    async fn transition(
        &self,
        _id: &Uuid,
        _from: HandshakeStatus,
        _to: HandshakeStatus,
        _responded_at: Option<DateTime<Utc>>,
    ) -> Result<bool, HandshakeRepositoryError> {
        Ok(true)
    }
}

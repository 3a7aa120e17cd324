//! PostgreSQL-backed `HandshakeRepository` implementation using Diesel ORM.
//!
//! The partial unique index on `(website_restaurant_id) WHERE
//! status = 'pending'` turns a concurrent duplicate submission into a
//! unique violation, surfaced as `DuplicatePending` so the service can
//! answer 409 with the winning request id. Expiry is never evaluated here;
//! the service owns the lazy terminal-state check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{HandshakeRepository, HandshakeRepositoryError};
use crate::domain::{
    CallbackUrl, HandshakeRequest, HandshakeStatus, RequesterInfo, RestaurantUid,
    WebsiteRestaurantId,
};

use super::diesel_error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{HandshakeRequestRow, NewHandshakeRequestRow};
use super::pool::{DbPool, PoolError};
use super::schema::handshake_requests;

/// Diesel-backed implementation of the handshake repository port.
#[derive(Clone)]
pub struct DieselHandshakeRepository {
    pool: DbPool,
}

impl DieselHandshakeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> HandshakeRepositoryError {
    map_pool_error(error, HandshakeRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> HandshakeRepositoryError {
    map_diesel_error(
        error,
        HandshakeRepositoryError::query,
        HandshakeRepositoryError::connection,
    )
}

/// Convert a database row into a validated domain handshake request.
fn row_to_request(
    row: HandshakeRequestRow,
) -> Result<HandshakeRequest, HandshakeRepositoryError> {
    let website_restaurant_id = WebsiteRestaurantId::new(row.website_restaurant_id)
        .map_err(|err| HandshakeRepositoryError::query(err.to_string()))?;
    let callback_url = CallbackUrl::parse(&row.callback_url)
        .map_err(|err| HandshakeRepositoryError::query(err.to_string()))?;
    let status: HandshakeStatus = row
        .status
        .parse()
        .map_err(|err: crate::domain::ParseHandshakeStatusError| {
            HandshakeRepositoryError::query(err.to_string())
        })?;

    Ok(HandshakeRequest {
        id: row.id,
        website_restaurant_id,
        callback_url,
        website_domain: row.website_domain,
        status,
        target_restaurant_uid: row.target_restaurant_uid.map(RestaurantUid::from_uuid),
        requester: RequesterInfo {
            ip: row.requester_ip,
            user_agent: row.requester_user_agent,
        },
        created_at: row.created_at,
        expires_at: row.expires_at,
        responded_at: row.responded_at,
    })
}

#[async_trait]
impl HandshakeRepository for DieselHandshakeRepository {
    async fn insert(&self, request: &HandshakeRequest) -> Result<(), HandshakeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewHandshakeRequestRow {
            id: request.id,
            website_restaurant_id: request.website_restaurant_id.as_str(),
            callback_url: request.callback_url.as_str(),
            website_domain: &request.website_domain,
            status: request.status.as_str(),
            target_restaurant_uid: request
                .target_restaurant_uid
                .as_ref()
                .map(|uid| *uid.as_uuid()),
            requester_ip: &request.requester.ip,
            requester_user_agent: request.requester.user_agent.as_deref(),
            created_at: request.created_at,
            expires_at: request.expires_at,
        };

        diesel::insert_into(handshake_requests::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    HandshakeRepositoryError::duplicate_pending(format!(
                        "website restaurant id {}",
                        request.website_restaurant_id
                    ))
                } else {
                    map_diesel(err)
                }
            })
    }

    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<HandshakeRequest>, HandshakeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = handshake_requests::table
            .filter(handshake_requests::id.eq(id))
            .select(HandshakeRequestRow::as_select())
            .first::<HandshakeRequestRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_request).transpose()
    }

    async fn find_pending_by_website_id(
        &self,
        website_restaurant_id: &WebsiteRestaurantId,
    ) -> Result<Option<HandshakeRequest>, HandshakeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = handshake_requests::table
            .filter(
                handshake_requests::website_restaurant_id
                    .eq(website_restaurant_id.as_str())
                    .and(handshake_requests::status.eq(HandshakeStatus::Pending.as_str())),
            )
            .order(handshake_requests::created_at.desc())
            .select(HandshakeRequestRow::as_select())
            .first::<HandshakeRequestRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_request).transpose()
    }

    async fn count_since_for_ip(
        &self,
        requester_ip: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, HandshakeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let count: i64 = handshake_requests::table
            .filter(
                handshake_requests::requester_ip
                    .eq(requester_ip)
                    .and(handshake_requests::created_at.ge(since)),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn list_pending_for_restaurant(
        &self,
        restaurant_uid: &RestaurantUid,
    ) -> Result<Vec<HandshakeRequest>, HandshakeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<HandshakeRequestRow> = handshake_requests::table
            .filter(
                handshake_requests::status
                    .eq(HandshakeStatus::Pending.as_str())
                    .and(
                        handshake_requests::target_restaurant_uid
                            .is_null()
                            .or(handshake_requests::target_restaurant_uid
                                .eq(restaurant_uid.as_uuid())),
                    ),
            )
            .order(handshake_requests::created_at.asc())
            .select(HandshakeRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_request).collect()
    }

    async fn transition(
        &self,
        id: &Uuid,
        from: HandshakeStatus,
        to: HandshakeStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> Result<bool, HandshakeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let updated = diesel::update(
            handshake_requests::table.filter(
                handshake_requests::id
                    .eq(id)
                    .and(handshake_requests::status.eq(from.as_str())),
            ),
        )
        .set((
            handshake_requests::status.eq(to.as_str()),
            handshake_requests::responded_at.eq(responded_at),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        Ok(updated == 1)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping and row conversion edge cases.

    use chrono::Duration;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn valid_row() -> HandshakeRequestRow {
        let now = Utc::now();
        HandshakeRequestRow {
            id: Uuid::new_v4(),
            website_restaurant_id: "165".to_owned(),
            callback_url: "https://bella.example/hook".to_owned(),
            website_domain: "bella.example".to_owned(),
            status: "pending".to_owned(),
            target_restaurant_uid: None,
            requester_ip: "203.0.113.7".to_owned(),
            requester_user_agent: Some("integration-test".to_owned()),
            created_at: now,
            expires_at: now + Duration::minutes(10),
            responded_at: None,
        }
    }

    #[rstest]
    fn row_conversion_accepts_a_valid_row(valid_row: HandshakeRequestRow) {
        let request = row_to_request(valid_row).expect("valid row converts");
        assert_eq!(request.status, HandshakeStatus::Pending);
        assert!(request.target_restaurant_uid.is_none());
    }

    #[rstest]
    fn row_conversion_rejects_unknown_statuses(mut valid_row: HandshakeRequestRow) {
        valid_row.status = "cancelled".to_owned();
        let error = row_to_request(valid_row).expect_err("unknown status fails");
        assert!(matches!(error, HandshakeRepositoryError::Query { .. }));
    }

    #[rstest]
    fn unique_violation_becomes_duplicate_pending() {
        let err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert!(is_unique_violation(&err));
    }
}

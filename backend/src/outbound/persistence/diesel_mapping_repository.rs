//! PostgreSQL-backed `MappingRepository` implementation using Diesel ORM.
//!
//! Activation is the supersede transaction: deactivate the current active
//! row for the website restaurant id, then insert the new one. The partial
//! unique index on `(website_restaurant_id) WHERE is_active` backstops the
//! invariant against writers that bypass this adapter.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{MappingRepository, MappingRepositoryError};
use crate::domain::{
    CallbackUrl, RestaurantMapping, RestaurantUid, WebsiteRestaurantId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{MappingRow, NewMappingRow};
use super::pool::{DbPool, PoolError};
use super::schema::restaurant_mappings;

/// Diesel-backed implementation of the mapping repository port.
#[derive(Clone)]
pub struct DieselMappingRepository {
    pool: DbPool,
}

impl DieselMappingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> MappingRepositoryError {
    map_pool_error(error, MappingRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> MappingRepositoryError {
    map_diesel_error(
        error,
        MappingRepositoryError::query,
        MappingRepositoryError::connection,
    )
}

/// Convert a database row into a validated domain mapping.
fn row_to_mapping(row: MappingRow) -> Result<RestaurantMapping, MappingRepositoryError> {
    let website_restaurant_id = WebsiteRestaurantId::new(row.website_restaurant_id)
        .map_err(|err| MappingRepositoryError::query(err.to_string()))?;
    let callback_url = CallbackUrl::parse(&row.callback_url)
        .map_err(|err| MappingRepositoryError::query(err.to_string()))?;

    Ok(RestaurantMapping {
        id: row.id,
        website_restaurant_id,
        restaurant_uid: RestaurantUid::from_uuid(row.restaurant_uid),
        callback_url,
        is_active: row.is_active,
        handshake_request_id: row.handshake_request_id,
        last_handshake_at: row.last_handshake_at,
        created_at: row.created_at,
    })
}

#[async_trait]
impl MappingRepository for DieselMappingRepository {
    async fn find_active_by_website_id(
        &self,
        website_restaurant_id: &WebsiteRestaurantId,
    ) -> Result<Option<RestaurantMapping>, MappingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = restaurant_mappings::table
            .filter(
                restaurant_mappings::website_restaurant_id
                    .eq(website_restaurant_id.as_str())
                    .and(restaurant_mappings::is_active.eq(true)),
            )
            .order(restaurant_mappings::last_handshake_at.desc())
            .select(MappingRow::as_select())
            .first::<MappingRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_mapping).transpose()
    }

    async fn find_active_pair(
        &self,
        website_restaurant_id: &WebsiteRestaurantId,
        restaurant_uid: &RestaurantUid,
    ) -> Result<Option<RestaurantMapping>, MappingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = restaurant_mappings::table
            .filter(
                restaurant_mappings::website_restaurant_id
                    .eq(website_restaurant_id.as_str())
                    .and(restaurant_mappings::restaurant_uid.eq(restaurant_uid.as_uuid()))
                    .and(restaurant_mappings::is_active.eq(true)),
            )
            .select(MappingRow::as_select())
            .first::<MappingRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_mapping).transpose()
    }

    async fn activate(&self, mapping: &RestaurantMapping) -> Result<(), MappingRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewMappingRow {
            id: mapping.id,
            website_restaurant_id: mapping.website_restaurant_id.as_str(),
            restaurant_uid: *mapping.restaurant_uid.as_uuid(),
            callback_url: mapping.callback_url.as_str(),
            is_active: mapping.is_active,
            handshake_request_id: mapping.handshake_request_id,
            last_handshake_at: mapping.last_handshake_at,
            created_at: mapping.created_at,
            updated_at: mapping.created_at,
        };

        conn.transaction(|conn| {
            async move {
                diesel::update(
                    restaurant_mappings::table.filter(
                        restaurant_mappings::website_restaurant_id
                            .eq(new_row.website_restaurant_id)
                            .and(restaurant_mappings::is_active.eq(true)),
                    ),
                )
                .set((
                    restaurant_mappings::is_active.eq(false),
                    restaurant_mappings::updated_at.eq(new_row.last_handshake_at),
                ))
                .execute(conn)
                .await?;

                diesel::insert_into(restaurant_mappings::table)
                    .values(&new_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }

    async fn list_active(&self) -> Result<Vec<RestaurantMapping>, MappingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<MappingRow> = restaurant_mappings::table
            .filter(restaurant_mappings::is_active.eq(true))
            .order(restaurant_mappings::last_handshake_at.desc())
            .select(MappingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_mapping).collect()
    }
}

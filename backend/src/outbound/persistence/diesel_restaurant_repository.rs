//! PostgreSQL-backed `RestaurantRepository` implementation using Diesel ORM.
//!
//! Registration deactivates any prior active row for the same website
//! restaurant id and inserts the new row inside one transaction, so the
//! newest registration is always the active one and the partial unique
//! index never trips under normal operation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RestaurantRepository, RestaurantRepositoryError};
use crate::domain::{
    CallbackUrl, RegisteredRestaurant, RestaurantUid, WebsiteRestaurantId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewRestaurantRow, RestaurantRow};
use super::pool::{DbPool, PoolError};
use super::schema::restaurants;

/// Diesel-backed implementation of the restaurant repository port.
#[derive(Clone)]
pub struct DieselRestaurantRepository {
    pool: DbPool,
}

impl DieselRestaurantRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> RestaurantRepositoryError {
    map_pool_error(error, RestaurantRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> RestaurantRepositoryError {
    map_diesel_error(
        error,
        RestaurantRepositoryError::query,
        RestaurantRepositoryError::connection,
    )
}

/// Convert a database row into a validated domain restaurant.
fn row_to_restaurant(
    row: RestaurantRow,
) -> Result<RegisteredRestaurant, RestaurantRepositoryError> {
    let RestaurantRow {
        uid,
        website_restaurant_id,
        name,
        phone,
        email,
        address,
        callback_url,
        is_active,
        created_at,
        updated_at,
    } = row;

    let website_restaurant_id = WebsiteRestaurantId::new(website_restaurant_id)
        .map_err(|err| RestaurantRepositoryError::query(err.to_string()))?;
    let callback_url = CallbackUrl::parse(&callback_url)
        .map_err(|err| RestaurantRepositoryError::query(err.to_string()))?;

    Ok(RegisteredRestaurant {
        uid: RestaurantUid::from_uuid(uid),
        website_restaurant_id,
        name,
        phone,
        email,
        address,
        callback_url,
        is_active,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl RestaurantRepository for DieselRestaurantRepository {
    async fn register(
        &self,
        restaurant: &RegisteredRestaurant,
    ) -> Result<(), RestaurantRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewRestaurantRow {
            uid: *restaurant.uid.as_uuid(),
            website_restaurant_id: restaurant.website_restaurant_id.as_str(),
            name: &restaurant.name,
            phone: &restaurant.phone,
            email: &restaurant.email,
            address: &restaurant.address,
            callback_url: restaurant.callback_url.as_str(),
            is_active: restaurant.is_active,
            created_at: restaurant.created_at,
            updated_at: restaurant.updated_at,
        };

        conn.transaction(|conn| {
            async move {
                diesel::update(
                    restaurants::table.filter(
                        restaurants::website_restaurant_id
                            .eq(new_row.website_restaurant_id)
                            .and(restaurants::is_active.eq(true)),
                    ),
                )
                .set((
                    restaurants::is_active.eq(false),
                    restaurants::updated_at.eq(new_row.updated_at),
                ))
                .execute(conn)
                .await?;

                diesel::insert_into(restaurants::table)
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

    async fn find_by_uid(
        &self,
        uid: &RestaurantUid,
    ) -> Result<Option<RegisteredRestaurant>, RestaurantRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = restaurants::table
            .filter(restaurants::uid.eq(uid.as_uuid()))
            .select(RestaurantRow::as_select())
            .first::<RestaurantRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_restaurant).transpose()
    }

    async fn list(&self) -> Result<Vec<RegisteredRestaurant>, RestaurantRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<RestaurantRow> = restaurants::table
            .order(restaurants::created_at.desc())
            .select(RestaurantRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_restaurant).collect()
    }
}

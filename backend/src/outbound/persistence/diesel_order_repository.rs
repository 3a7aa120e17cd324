//! PostgreSQL-backed `OrderRepository` implementation using Diesel ORM.
//!
//! The unique constraint on `idempotency_key` makes duplicate submission a
//! database-level impossibility; a violation is surfaced as `DuplicateKey`
//! and the service replays the stored row. Items and customer details are
//! stored as JSONB and decoded through the domain's serde types.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{OrderRepository, OrderRepositoryError};
use crate::domain::{
    CallbackUrl, Currency, Customer, IdempotencyKey, Money, Order, OrderItem, OrderStatus,
    PayloadHash, RestaurantUid, WebsiteRestaurantId,
};

use super::diesel_error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{NewOrderRow, OrderRow};
use super::pool::{DbPool, PoolError};
use super::schema::orders;

/// Diesel-backed implementation of the order repository port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> OrderRepositoryError {
    map_pool_error(error, OrderRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> OrderRepositoryError {
    map_diesel_error(
        error,
        OrderRepositoryError::query,
        OrderRepositoryError::connection,
    )
}

fn encode_items(order: &Order) -> Result<serde_json::Value, OrderRepositoryError> {
    serde_json::to_value(&order.items)
        .map_err(|err| OrderRepositoryError::serialization(format!("encode items: {err}")))
}

fn encode_customer(order: &Order) -> Result<serde_json::Value, OrderRepositoryError> {
    serde_json::to_value(&order.customer)
        .map_err(|err| OrderRepositoryError::serialization(format!("encode customer: {err}")))
}

/// Convert a database row into a validated domain order.
fn row_to_order(row: OrderRow) -> Result<Order, OrderRepositoryError> {
    let OrderRow {
        id,
        order_number,
        amount_minor,
        amount_display,
        currency,
        status,
        items,
        customer,
        restaurant_uid,
        website_restaurant_id,
        callback_url,
        idempotency_key,
        payload_hash,
        created_at,
        updated_at,
    } = row;

    let currency = Currency::new(&currency)
        .map_err(|err| OrderRepositoryError::query(err.to_string()))?;
    let status: OrderStatus = status
        .parse()
        .map_err(|err: crate::domain::ParseOrderStatusError| {
            OrderRepositoryError::query(err.to_string())
        })?;
    let items: Vec<OrderItem> = serde_json::from_value(items)
        .map_err(|err| OrderRepositoryError::serialization(format!("decode items: {err}")))?;
    let customer: Customer = serde_json::from_value(customer)
        .map_err(|err| OrderRepositoryError::serialization(format!("decode customer: {err}")))?;
    let website_restaurant_id = WebsiteRestaurantId::new(website_restaurant_id)
        .map_err(|err| OrderRepositoryError::query(err.to_string()))?;
    let callback_url = callback_url
        .map(|raw| CallbackUrl::parse(&raw))
        .transpose()
        .map_err(|err| OrderRepositoryError::query(err.to_string()))?;
    let idempotency_key = IdempotencyKey::new(idempotency_key)
        .map_err(|err| OrderRepositoryError::query(err.to_string()))?;
    let payload_hash = PayloadHash::from_hex(&payload_hash)
        .map_err(|err| OrderRepositoryError::query(err.to_string()))?;

    Ok(Order {
        id,
        order_number,
        money: Money {
            minor: amount_minor,
            currency,
            display: amount_display,
        },
        status,
        items,
        customer,
        restaurant_uid: RestaurantUid::from_uuid(restaurant_uid),
        website_restaurant_id,
        callback_url,
        idempotency_key,
        payload_hash,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let items = encode_items(order)?;
        let customer = encode_customer(order)?;
        let payload_hash = order.payload_hash.to_hex();

        let new_row = NewOrderRow {
            id: order.id,
            order_number: &order.order_number,
            amount_minor: order.money.minor,
            amount_display: &order.money.display,
            currency: order.money.currency.as_str(),
            status: order.status.as_str(),
            items: &items,
            customer: &customer,
            restaurant_uid: *order.restaurant_uid.as_uuid(),
            website_restaurant_id: order.website_restaurant_id.as_str(),
            callback_url: order.callback_url.as_ref().map(CallbackUrl::as_str),
            idempotency_key: order.idempotency_key.as_str(),
            payload_hash: &payload_hash,
            created_at: order.created_at,
            updated_at: order.updated_at,
        };

        diesel::insert_into(orders::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    OrderRepositoryError::duplicate_key(order.idempotency_key.as_str())
                } else {
                    map_diesel(err)
                }
            })
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = orders::table
            .filter(orders::idempotency_key.eq(key.as_str()))
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_order).transpose()
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_order).transpose()
    }

    async fn update_status(
        &self,
        id: &Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let updated = diesel::update(
            orders::table.filter(orders::id.eq(id).and(orders::status.eq(from.as_str()))),
        )
        .set(orders::status.eq(to.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        Ok(updated == 1)
    }

    async fn list_for_restaurant(
        &self,
        restaurant_uid: &RestaurantUid,
        limit: i64,
    ) -> Result<Vec<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<OrderRow> = orders::table
            .filter(orders::restaurant_uid.eq(restaurant_uid.as_uuid()))
            .order((orders::created_at.desc(), orders::id.desc()))
            .limit(limit)
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_order).collect()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping and row conversion edge cases.

    use chrono::Utc;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn valid_row() -> OrderRow {
        let now = Utc::now();
        OrderRow {
            id: Uuid::new_v4(),
            order_number: "WEB-1042".to_owned(),
            amount_minor: 2390,
            amount_display: "23.90".to_owned(),
            currency: "EUR".to_owned(),
            status: "pending".to_owned(),
            items: json!([
                { "name": "Margherita", "quantity": 2, "customizations": ["extra basil"] }
            ]),
            customer: json!({ "name": "Ada", "phone": "+44 20 7946 0456" }),
            restaurant_uid: Uuid::new_v4(),
            website_restaurant_id: "165".to_owned(),
            callback_url: None,
            idempotency_key: "abc".to_owned(),
            payload_hash: "ab".repeat(32),
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn row_conversion_accepts_a_valid_row(valid_row: OrderRow) {
        let order = row_to_order(valid_row).expect("valid row converts");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.money.minor, 2390);
        assert_eq!(order.items.len(), 1);
    }

    #[rstest]
    fn row_conversion_rejects_corrupt_items_json(mut valid_row: OrderRow) {
        valid_row.items = json!({ "not": "an-array" });
        let error = row_to_order(valid_row).expect_err("corrupt items fail");
        assert!(matches!(error, OrderRepositoryError::Serialization { .. }));
    }

    #[rstest]
    fn row_conversion_rejects_corrupt_payload_hashes(mut valid_row: OrderRow) {
        valid_row.payload_hash = "not-hex".to_owned();
        let error = row_to_order(valid_row).expect_err("corrupt hash fails");
        assert!(matches!(error, OrderRepositoryError::Query { .. }));
    }

    #[rstest]
    fn unique_violation_becomes_duplicate_key() {
        let err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert!(is_unique_violation(&err));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool(PoolError::checkout("connection refused"));
        assert!(matches!(repo_err, OrderRepositoryError::Connection { .. }));
    }
}

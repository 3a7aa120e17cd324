//! Driving ports for order relay and kitchen order handling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Error, Order, OrderDraft, OrderStatus, RestaurantUid};

/// Request payload for relaying an inbound order.
#[derive(Debug, Clone)]
pub struct ReceiveOrderRequest {
    /// Validated order fields as submitted by the website.
    pub draft: OrderDraft,
}

/// Key fields of a stored order, echoed to the website.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    /// Row identifier.
    pub order_id: Uuid,
    /// Website-side order number.
    pub order_number: String,
    /// The kitchen the order was routed to.
    pub restaurant_uid: RestaurantUid,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Receipt timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderReceipt {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            order_number: order.order_number.clone(),
            restaurant_uid: order.restaurant_uid,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

/// Outcome of relaying an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOrderOutcome {
    /// A new order row was created.
    Created(OrderReceipt),
    /// The idempotency key was seen before with an identical payload; the
    /// stored order is replayed. Adapters report this as success, not error.
    Replayed(OrderReceipt),
}

impl ReceiveOrderOutcome {
    /// The receipt regardless of outcome.
    #[must_use]
    pub fn receipt(&self) -> &OrderReceipt {
        match self {
            Self::Created(receipt) | Self::Replayed(receipt) => receipt,
        }
    }
}

/// Use-case port: accept an order from a website and route it to a kitchen.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRelayCommand: Send + Sync {
    /// Resolve the mapping and persist the order idempotently.
    async fn receive(&self, request: ReceiveOrderRequest)
    -> Result<ReceiveOrderOutcome, Error>;
}

/// Request payload for a kitchen-side status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOrderStatusRequest {
    /// The order being updated.
    pub order_id: Uuid,
    /// Desired state.
    pub next_status: OrderStatus,
}

/// Response after a status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOrderStatusResponse {
    /// The order that moved.
    pub order_id: Uuid,
    /// State after the transition.
    pub status: OrderStatus,
}

/// Use-case port: kitchen-side status transitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStatusCommand: Send + Sync {
    /// Move an order along `pending → approved/cancelled → completed`.
    async fn update_status(
        &self,
        request: UpdateOrderStatusRequest,
    ) -> Result<UpdateOrderStatusResponse, Error>;
}

/// Request payload for the kitchen order board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOrdersRequest {
    /// The polling kitchen.
    pub restaurant_uid: RestaurantUid,
    /// Optional cap on the number of rows returned.
    pub limit: Option<i64>,
}

/// Orders scoped to one kitchen.
#[derive(Debug, Clone)]
pub struct ListOrdersResponse {
    /// Orders, newest first.
    pub orders: Vec<Order>,
}

/// Use-case port: kitchen-side order reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderQuery: Send + Sync {
    /// Orders for the kitchen, newest first.
    async fn list_for_restaurant(
        &self,
        request: ListOrdersRequest,
    ) -> Result<ListOrdersResponse, Error>;
}

/// Fixture implementation acknowledging orders without persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderRelayCommand;

#[async_trait]
impl OrderRelayCommand for FixtureOrderRelayCommand {
    async fn receive(
        &self,
        request: ReceiveOrderRequest,
    ) -> Result<ReceiveOrderOutcome, Error> {
        let draft = request.draft;
        let restaurant_uid = draft
            .asserted_restaurant_uid
            .unwrap_or_else(RestaurantUid::generate);
        Ok(ReceiveOrderOutcome::Created(OrderReceipt {
            order_id: Uuid::new_v4(),
            order_number: draft.order_number,
            restaurant_uid,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }))
    }
}

/// Fixture implementation echoing status transitions.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderStatusCommand;

#[async_trait]
impl OrderStatusCommand for FixtureOrderStatusCommand {
    async fn update_status(
        &self,
        request: UpdateOrderStatusRequest,
    ) -> Result<UpdateOrderStatusResponse, Error> {
        Ok(UpdateOrderStatusResponse {
            order_id: request.order_id,
            status: request.next_status,
        })
    }
}

/// Fixture implementation reporting an empty order board.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderQuery;

#[async_trait]
impl OrderQuery for FixtureOrderQuery {
    async fn list_for_restaurant(
        &self,
        _request: ListOrdersRequest,
    ) -> Result<ListOrdersResponse, Error> {
        Ok(ListOrdersResponse { orders: Vec::new() })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use crate::domain::{
        Currency, Customer, IdempotencyKey, Money, WebsiteRestaurantId, canonicalize_and_hash,
    };
    use serde_json::json;

    fn sample_draft(asserted: Option<RestaurantUid>) -> OrderDraft {
        OrderDraft {
            website_restaurant_id: WebsiteRestaurantId::new("165").expect("valid id"),
            asserted_restaurant_uid: asserted,
            order_number: "WEB-1042".to_owned(),
            money: Money::parse("23.90", Currency::new("EUR").expect("valid code"))
                .expect("valid amount"),
            items: Vec::new(),
            customer: Customer {
                name: "Ada".to_owned(),
                phone: None,
                email: None,
                address: None,
            },
            callback_url: None,
            idempotency_key: IdempotencyKey::new("abc").expect("valid key"),
            payload_hash: canonicalize_and_hash(&json!({"orderNumber": "WEB-1042"}))
                .expect("hashable"),
        }
    }

    #[tokio::test]
    async fn fixture_echoes_the_asserted_uid() {
        let fixture = FixtureOrderRelayCommand;
        let uid = RestaurantUid::generate();
        let outcome = fixture
            .receive(ReceiveOrderRequest {
                draft: sample_draft(Some(uid)),
            })
            .await
            .expect("fixture receives");
        assert_eq!(outcome.receipt().restaurant_uid, uid);
        assert_eq!(outcome.receipt().status, OrderStatus::Pending);
    }
}

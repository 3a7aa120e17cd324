//! Order relay and kitchen order domain services.
//!
//! The relay resolves the website restaurant id to a registered kitchen via
//! the active mapping, then inserts the order idempotently: a resubmitted
//! key with an identical payload replays the stored order, a different
//! payload under the same key is a conflict, and a concurrent duplicate
//! insert falls back to replaying whatever the unique constraint kept.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    ListOrdersRequest, ListOrdersResponse, MappingRepository, MappingRepositoryError,
    OrderQuery, OrderReceipt, OrderRelayCommand, OrderRepository, OrderRepositoryError,
    OrderStatusCommand, ReceiveOrderOutcome, ReceiveOrderRequest, RestaurantRepository,
    RestaurantRepositoryError, UpdateOrderStatusRequest, UpdateOrderStatusResponse,
};
use crate::domain::{Error, Order, OrderDraft, RestaurantUid};

/// Default cap on kitchen order listings.
const DEFAULT_LIST_LIMIT: i64 = 50;

fn map_order_error(error: OrderRepositoryError) -> Error {
    match error {
        OrderRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("order repository unavailable: {message}"))
        }
        OrderRepositoryError::Query { message } => {
            Error::internal(format!("order repository error: {message}"))
        }
        OrderRepositoryError::Serialization { message } => {
            Error::internal(format!("order row encoding failed: {message}"))
        }
        OrderRepositoryError::DuplicateKey { message } => {
            Error::conflict(format!("duplicate idempotency key: {message}"))
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

fn map_restaurant_error(error: RestaurantRepositoryError) -> Error {
    match error {
        RestaurantRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("restaurant repository unavailable: {message}"))
        }
        RestaurantRepositoryError::Query { message } => {
            Error::internal(format!("restaurant repository error: {message}"))
        }
    }
}

fn key_conflict(draft: &OrderDraft) -> Error {
    Error::conflict("idempotency key was reused with a different payload").with_details(json!({
        "idempotency_key": draft.idempotency_key.as_str(),
    }))
}

/// Order relay service implementing the [`OrderRelayCommand`] port.
#[derive(Clone)]
pub struct OrderRelayService<O, M, R> {
    orders: Arc<O>,
    mappings: Arc<M>,
    restaurants: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<O, M, R> OrderRelayService<O, M, R> {
    /// Create a new order relay service.
    pub fn new(
        orders: Arc<O>,
        mappings: Arc<M>,
        restaurants: Arc<R>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            mappings,
            restaurants,
            clock,
        }
    }
}

impl<O, M, R> OrderRelayService<O, M, R>
where
    O: OrderRepository,
    M: MappingRepository,
    R: RestaurantRepository,
{
    /// Resolve the kitchen an order routes to.
    ///
    /// A caller-asserted uid must match an active mapping for the same
    /// website restaurant id; a bare uid is not a capability. Without an
    /// asserted uid the active mapping alone decides.
    async fn resolve_restaurant_uid(&self, draft: &OrderDraft) -> Result<RestaurantUid, Error> {
        match draft.asserted_restaurant_uid {
            Some(asserted) => {
                let mapping = self
                    .mappings
                    .find_active_pair(&draft.website_restaurant_id, &asserted)
                    .await
                    .map_err(map_mapping_error)?;
                mapping.map(|m| m.restaurant_uid).ok_or_else(|| {
                    Error::forbidden(
                        "restaurant uid does not match an active mapping for this website restaurant id",
                    )
                })
            }
            None => {
                let mapping = self
                    .mappings
                    .find_active_by_website_id(&draft.website_restaurant_id)
                    .await
                    .map_err(map_mapping_error)?;
                mapping.map(|m| m.restaurant_uid).ok_or_else(|| {
                    Error::not_found(
                        "no active mapping for this website restaurant id; complete a handshake first",
                    )
                })
            }
        }
    }

    async fn ensure_restaurant_active(&self, uid: &RestaurantUid) -> Result<(), Error> {
        let restaurant = self
            .restaurants
            .find_by_uid(uid)
            .await
            .map_err(map_restaurant_error)?;
        match restaurant {
            Some(found) if found.is_active => Ok(()),
            _ => Err(Error::not_found(
                "restaurant is not registered or no longer active",
            )),
        }
    }

    /// Replay the stored order for a reused key, or conflict when the
    /// payload differs.
    fn replay_or_conflict(
        draft: &OrderDraft,
        existing: &Order,
    ) -> Result<ReceiveOrderOutcome, Error> {
        if existing.payload_hash == draft.payload_hash {
            info!(
                order_id = %existing.id,
                idempotency_key = %existing.idempotency_key,
                "order replayed for reused idempotency key"
            );
            Ok(ReceiveOrderOutcome::Replayed(OrderReceipt::from(existing)))
        } else {
            Err(key_conflict(draft))
        }
    }
}

#[async_trait]
impl<O, M, R> OrderRelayCommand for OrderRelayService<O, M, R>
where
    O: OrderRepository,
    M: MappingRepository,
    R: RestaurantRepository,
{
    async fn receive(
        &self,
        request: ReceiveOrderRequest,
    ) -> Result<ReceiveOrderOutcome, Error> {
        let draft = request.draft;

        let restaurant_uid = self.resolve_restaurant_uid(&draft).await?;
        self.ensure_restaurant_active(&restaurant_uid).await?;

        if let Some(existing) = self
            .orders
            .find_by_idempotency_key(&draft.idempotency_key)
            .await
            .map_err(map_order_error)?
        {
            return Self::replay_or_conflict(&draft, &existing);
        }

        let order = Order::from_draft(draft.clone(), restaurant_uid, self.clock.utc());
        match self.orders.insert(&order).await {
            Ok(()) => {
                info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    restaurant_uid = %restaurant_uid,
                    website_restaurant_id = %order.website_restaurant_id,
                    "order relayed"
                );
                Ok(ReceiveOrderOutcome::Created(OrderReceipt::from(&order)))
            }
            Err(OrderRepositoryError::DuplicateKey { .. }) => {
                // Lost the unique-constraint race; the stored row wins.
                let existing = self
                    .orders
                    .find_by_idempotency_key(&draft.idempotency_key)
                    .await
                    .map_err(map_order_error)?
                    .ok_or_else(|| {
                        Error::internal("duplicate idempotency key without a stored order")
                    })?;
                Self::replay_or_conflict(&draft, &existing)
            }
            Err(other) => Err(map_order_error(other)),
        }
    }
}

/// Kitchen-side order service implementing status transitions and reads.
#[derive(Clone)]
pub struct KitchenOrderService<O> {
    orders: Arc<O>,
}

impl<O> KitchenOrderService<O> {
    /// Create a new kitchen order service.
    pub fn new(orders: Arc<O>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl<O> OrderStatusCommand for KitchenOrderService<O>
where
    O: OrderRepository,
{
    async fn update_status(
        &self,
        request: UpdateOrderStatusRequest,
    ) -> Result<UpdateOrderStatusResponse, Error> {
        let order = self
            .orders
            .find_by_id(&request.order_id)
            .await
            .map_err(map_order_error)?
            .ok_or_else(|| Error::not_found(format!("order {} not found", request.order_id)))?;

        if !order.status.can_transition_to(request.next_status) {
            return Err(Error::conflict(format!(
                "order cannot move from {} to {}",
                order.status, request.next_status
            )));
        }

        let moved = self
            .orders
            .update_status(&request.order_id, order.status, request.next_status)
            .await
            .map_err(map_order_error)?;
        if !moved {
            return Err(Error::conflict("order status changed concurrently"));
        }

        info!(
            order_id = %request.order_id,
            from = %order.status,
            to = %request.next_status,
            "order status updated"
        );

        Ok(UpdateOrderStatusResponse {
            order_id: request.order_id,
            status: request.next_status,
        })
    }
}

#[async_trait]
impl<O> OrderQuery for KitchenOrderService<O>
where
    O: OrderRepository,
{
    async fn list_for_restaurant(
        &self,
        request: ListOrdersRequest,
    ) -> Result<ListOrdersResponse, Error> {
        let limit = request
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, DEFAULT_LIST_LIMIT);
        let orders = self
            .orders
            .list_for_restaurant(&request.restaurant_uid, limit)
            .await
            .map_err(map_order_error)?;
        Ok(ListOrdersResponse { orders })
    }
}

#[cfg(test)]
#[path = "order_relay_service_tests.rs"]
mod tests;

//! Shared test doubles for integration tests.
//!
//! [`MemoryRelayStore`] implements every repository port over in-process
//! state with the same observable semantics as the PostgreSQL adapters:
//! duplicate pending handshakes and reused idempotency keys fail the same
//! way, and activation supersedes the prior mapping atomically under its
//! lock. This lets the full HTTP surface run end-to-end without a cluster.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use uuid::Uuid;

use relay_backend::domain::ports::{
    HandshakeRepository, HandshakeRepositoryError, MappingRepository, MappingRepositoryError,
    OrderRepository, OrderRepositoryError, RestaurantRepository, RestaurantRepositoryError,
};
use relay_backend::domain::{
    HandshakeRequest, HandshakeStatus, IdempotencyKey, Order, OrderStatus, RegisteredRestaurant,
    RestaurantMapping, RestaurantUid, WebsiteRestaurantId,
};

/// Deterministic clock whose current instant tests can move forward.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Create a clock frozen at `start`.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().expect("clock mutex")
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    restaurants: Vec<RegisteredRestaurant>,
    mappings: Vec<RestaurantMapping>,
    handshakes: Vec<HandshakeRequest>,
    orders: Vec<Order>,
}

/// In-memory stand-in for the PostgreSQL store.
#[derive(Debug, Default, Clone)]
pub struct MemoryRelayStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryRelayStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("store mutex")
    }

    /// Number of stored orders; used to assert rejected submissions left
    /// nothing behind.
    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    /// Stored order by idempotency key, for assertions.
    pub fn order_by_key(&self, key: &str) -> Option<Order> {
        self.lock()
            .orders
            .iter()
            .find(|order| order.idempotency_key.as_str() == key)
            .cloned()
    }

    /// Active mapping for a website restaurant id, for assertions.
    pub fn active_mapping(&self, website_restaurant_id: &str) -> Option<RestaurantMapping> {
        self.lock()
            .mappings
            .iter()
            .find(|m| m.is_active && m.website_restaurant_id.as_str() == website_restaurant_id)
            .cloned()
    }

    /// Count of active mappings for a website restaurant id; asserts the
    /// at-most-one-active invariant.
    pub fn active_mapping_count(&self, website_restaurant_id: &str) -> usize {
        self.lock()
            .mappings
            .iter()
            .filter(|m| m.is_active && m.website_restaurant_id.as_str() == website_restaurant_id)
            .count()
    }
}

#[async_trait]
impl RestaurantRepository for MemoryRelayStore {
    async fn register(
        &self,
        restaurant: &RegisteredRestaurant,
    ) -> Result<(), RestaurantRepositoryError> {
        let mut state = self.lock();
        for existing in state
            .restaurants
            .iter_mut()
            .filter(|r| r.website_restaurant_id == restaurant.website_restaurant_id)
        {
            existing.is_active = false;
        }
        state.restaurants.push(restaurant.clone());
        Ok(())
    }

    async fn find_by_uid(
        &self,
        uid: &RestaurantUid,
    ) -> Result<Option<RegisteredRestaurant>, RestaurantRepositoryError> {
        Ok(self
            .lock()
            .restaurants
            .iter()
            .find(|r| &r.uid == uid)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<RegisteredRestaurant>, RestaurantRepositoryError> {
        let mut restaurants = self.lock().restaurants.clone();
        restaurants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(restaurants)
    }
}

#[async_trait]
impl MappingRepository for MemoryRelayStore {
    async fn find_active_by_website_id(
        &self,
        website_restaurant_id: &WebsiteRestaurantId,
    ) -> Result<Option<RestaurantMapping>, MappingRepositoryError> {
        Ok(self
            .lock()
            .mappings
            .iter()
            .filter(|m| m.is_active && &m.website_restaurant_id == website_restaurant_id)
            .max_by_key(|m| m.last_handshake_at)
            .cloned())
    }

    async fn find_active_pair(
        &self,
        website_restaurant_id: &WebsiteRestaurantId,
        restaurant_uid: &RestaurantUid,
    ) -> Result<Option<RestaurantMapping>, MappingRepositoryError> {
        Ok(self
            .lock()
            .mappings
            .iter()
            .find(|m| {
                m.is_active
                    && &m.website_restaurant_id == website_restaurant_id
                    && &m.restaurant_uid == restaurant_uid
            })
            .cloned())
    }

    async fn activate(&self, mapping: &RestaurantMapping) -> Result<(), MappingRepositoryError> {
        let mut state = self.lock();
        for existing in state
            .mappings
            .iter_mut()
            .filter(|m| m.website_restaurant_id == mapping.website_restaurant_id)
        {
            existing.is_active = false;
        }
        state.mappings.push(mapping.clone());
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<RestaurantMapping>, MappingRepositoryError> {
        Ok(self
            .lock()
            .mappings
            .iter()
            .filter(|m| m.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HandshakeRepository for MemoryRelayStore {
    async fn insert(&self, request: &HandshakeRequest) -> Result<(), HandshakeRepositoryError> {
        let mut state = self.lock();
        if state.handshakes.iter().any(|h| {
            h.status == HandshakeStatus::Pending
                && h.website_restaurant_id == request.website_restaurant_id
        }) {
            return Err(HandshakeRepositoryError::duplicate_pending(format!(
                "website restaurant id {}",
                request.website_restaurant_id
            )));
        }
        state.handshakes.push(request.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<HandshakeRequest>, HandshakeRepositoryError> {
        Ok(self.lock().handshakes.iter().find(|h| &h.id == id).cloned())
    }

    async fn find_pending_by_website_id(
        &self,
        website_restaurant_id: &WebsiteRestaurantId,
    ) -> Result<Option<HandshakeRequest>, HandshakeRepositoryError> {
        Ok(self
            .lock()
            .handshakes
            .iter()
            .filter(|h| {
                h.status == HandshakeStatus::Pending
                    && &h.website_restaurant_id == website_restaurant_id
            })
            .max_by_key(|h| h.created_at)
            .cloned())
    }

    async fn count_since_for_ip(
        &self,
        requester_ip: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, HandshakeRepositoryError> {
        let count = self
            .lock()
            .handshakes
            .iter()
            .filter(|h| h.requester.ip == requester_ip && h.created_at >= since)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn list_pending_for_restaurant(
        &self,
        restaurant_uid: &RestaurantUid,
    ) -> Result<Vec<HandshakeRequest>, HandshakeRepositoryError> {
        let mut rows: Vec<_> = self
            .lock()
            .handshakes
            .iter()
            .filter(|h| h.status == HandshakeStatus::Pending && h.addresses(restaurant_uid))
            .cloned()
            .collect();
        rows.sort_by_key(|h| h.created_at);
        Ok(rows)
    }

    async fn transition(
        &self,
        id: &Uuid,
        from: HandshakeStatus,
        to: HandshakeStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> Result<bool, HandshakeRepositoryError> {
        let mut state = self.lock();
        match state
            .handshakes
            .iter_mut()
            .find(|h| &h.id == id && h.status == from)
        {
            Some(row) => {
                row.status = to;
                row.responded_at = responded_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl OrderRepository for MemoryRelayStore {
    async fn insert(&self, order: &Order) -> Result<(), OrderRepositoryError> {
        let mut state = self.lock();
        if state
            .orders
            .iter()
            .any(|o| o.idempotency_key == order.idempotency_key)
        {
            return Err(OrderRepositoryError::duplicate_key(
                order.idempotency_key.as_str(),
            ));
        }
        state.orders.push(order.clone());
        Ok(())
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .find(|o| &o.idempotency_key == key)
            .cloned())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(self.lock().orders.iter().find(|o| &o.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: &Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, OrderRepositoryError> {
        let mut state = self.lock();
        match state
            .orders
            .iter_mut()
            .find(|o| &o.id == id && o.status == from)
        {
            Some(row) => {
                row.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_for_restaurant(
        &self,
        restaurant_uid: &RestaurantUid,
        limit: i64,
    ) -> Result<Vec<Order>, OrderRepositoryError> {
        let mut rows: Vec<_> = self
            .lock()
            .orders
            .iter()
            .filter(|o| &o.restaurant_uid == restaurant_uid)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

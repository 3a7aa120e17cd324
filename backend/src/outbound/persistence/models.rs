//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{handshake_requests, orders, restaurant_mappings, restaurants};

// ---------------------------------------------------------------------------
// Restaurant models
// ---------------------------------------------------------------------------

/// Row struct for reading from the restaurants table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = restaurants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RestaurantRow {
    pub uid: Uuid,
    pub website_restaurant_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub callback_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new restaurant records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = restaurants)]
pub(crate) struct NewRestaurantRow<'a> {
    pub uid: Uuid,
    pub website_restaurant_id: &'a str,
    pub name: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub address: &'a str,
    pub callback_url: &'a str,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Mapping models
// ---------------------------------------------------------------------------

/// Row struct for reading from the restaurant_mappings table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = restaurant_mappings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MappingRow {
    pub id: Uuid,
    pub website_restaurant_id: String,
    pub restaurant_uid: Uuid,
    pub callback_url: String,
    pub is_active: bool,
    pub handshake_request_id: Option<Uuid>,
    pub last_handshake_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field read only by admin tooling")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for activating a mapping.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = restaurant_mappings)]
pub(crate) struct NewMappingRow<'a> {
    pub id: Uuid,
    pub website_restaurant_id: &'a str,
    pub restaurant_uid: Uuid,
    pub callback_url: &'a str,
    pub is_active: bool,
    pub handshake_request_id: Option<Uuid>,
    pub last_handshake_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Handshake models
// ---------------------------------------------------------------------------

/// Row struct for reading from the handshake_requests table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = handshake_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HandshakeRequestRow {
    pub id: Uuid,
    pub website_restaurant_id: String,
    pub callback_url: String,
    pub website_domain: String,
    pub status: String,
    pub target_restaurant_uid: Option<Uuid>,
    pub requester_ip: String,
    pub requester_user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Insertable struct for opening a handshake request.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = handshake_requests)]
pub(crate) struct NewHandshakeRequestRow<'a> {
    pub id: Uuid,
    pub website_restaurant_id: &'a str,
    pub callback_url: &'a str,
    pub website_domain: &'a str,
    pub status: &'a str,
    pub target_restaurant_uid: Option<Uuid>,
    pub requester_ip: &'a str,
    pub requester_user_agent: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Order models
// ---------------------------------------------------------------------------

/// Row struct for reading from the orders table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub amount_minor: i64,
    pub amount_display: String,
    pub currency: String,
    pub status: String,
    pub items: serde_json::Value,
    pub customer: serde_json::Value,
    pub restaurant_uid: Uuid,
    pub website_restaurant_id: String,
    pub callback_url: Option<String>,
    pub idempotency_key: String,
    pub payload_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for storing a relayed order.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub(crate) struct NewOrderRow<'a> {
    pub id: Uuid,
    pub order_number: &'a str,
    pub amount_minor: i64,
    pub amount_display: &'a str,
    pub currency: &'a str,
    pub status: &'a str,
    pub items: &'a serde_json::Value,
    pub customer: &'a serde_json::Value,
    pub restaurant_uid: Uuid,
    pub website_restaurant_id: &'a str,
    pub callback_url: Option<&'a str>,
    pub idempotency_key: &'a str,
    pub payload_hash: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

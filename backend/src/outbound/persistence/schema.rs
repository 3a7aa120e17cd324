//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations exactly; Diesel uses them
//! for compile-time query validation and type-safe SQL generation.
//! Regenerate with `diesel print-schema` after changing migrations.

diesel::table! {
    /// Registered restaurants.
    ///
    /// One row per onboarding; re-registration deactivates the prior row
    /// and inserts a new one, so `uid` values are never reused.
    restaurants (uid) {
        /// Primary key: relay-issued UUID v4.
        uid -> Uuid,
        /// Identifier assigned by the external website.
        website_restaurant_id -> Varchar,
        /// Display name.
        name -> Varchar,
        /// Contact phone number.
        phone -> Varchar,
        /// Contact email address.
        email -> Varchar,
        /// Street address.
        address -> Varchar,
        /// Website callback endpoint.
        callback_url -> Varchar,
        /// Soft-delete flag; a partial unique index keeps at most one
        /// active row per website restaurant id.
        is_active -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (auto-updated by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Active bindings between website restaurant ids and relay uids.
    restaurant_mappings (id) {
        /// Primary key.
        id -> Uuid,
        /// Identifier assigned by the external website.
        website_restaurant_id -> Varchar,
        /// Relay uid the binding resolves to.
        restaurant_uid -> Uuid,
        /// Callback endpoint captured when the mapping was established.
        callback_url -> Varchar,
        /// Whether this row is the live binding; a partial unique index
        /// keeps at most one active row per website restaurant id.
        is_active -> Bool,
        /// Handshake request that produced the mapping, when one did.
        handshake_request_id -> Nullable<Uuid>,
        /// When the binding was last confirmed by a handshake.
        last_handshake_at -> Timestamptz,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (auto-updated by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Handshake request lifecycle rows.
    handshake_requests (id) {
        /// Primary key, returned to the website for polling.
        id -> Uuid,
        /// Identifier assigned by the external website.
        website_restaurant_id -> Varchar,
        /// Callback endpoint to confirm against.
        callback_url -> Varchar,
        /// Requesting website domain.
        website_domain -> Varchar,
        /// Lifecycle state; a partial unique index keeps at most one
        /// `pending` row per website restaurant id.
        status -> Varchar,
        /// Kitchen the request is directed at; null for broadcasts.
        target_restaurant_uid -> Nullable<Uuid>,
        /// Submitting address, for rate limiting and audit.
        requester_ip -> Varchar,
        /// Submitting user agent, when present.
        requester_user_agent -> Nullable<Varchar>,
        /// Submission timestamp.
        created_at -> Timestamptz,
        /// Response deadline; pending rows past it read as expired.
        expires_at -> Timestamptz,
        /// When a kitchen responded, for terminal rows.
        responded_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Orders relayed from websites to kitchens.
    orders (id) {
        /// Primary key.
        id -> Uuid,
        /// Website-side order number.
        order_number -> Varchar,
        /// Order total in minor units.
        amount_minor -> Int8,
        /// Normalised decimal form of the total.
        amount_display -> Varchar,
        /// ISO 4217 style currency code.
        currency -> Varchar,
        /// Kitchen-facing lifecycle state.
        status -> Varchar,
        /// Line items with optional customisations.
        items -> Jsonb,
        /// Customer contact and delivery details.
        customer -> Jsonb,
        /// Resolved kitchen identifier the app filters on.
        restaurant_uid -> Uuid,
        /// Originating website identifier, retained for audit.
        website_restaurant_id -> Varchar,
        /// Optional per-order callback endpoint.
        callback_url -> Nullable<Varchar>,
        /// Caller-supplied replay token; unique across all orders.
        idempotency_key -> Varchar,
        /// SHA-256 hex fingerprint of the submitted payload.
        payload_hash -> Varchar,
        /// Receipt timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (auto-updated by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(orders -> restaurants (restaurant_uid));
diesel::joinable!(restaurant_mappings -> restaurants (restaurant_uid));

diesel::allow_tables_to_appear_in_same_query!(
    restaurants,
    restaurant_mappings,
    handshake_requests,
    orders,
);

//! End-to-end tests for the relay protocol over the HTTP surface.
//!
//! Real domain services run against the in-memory store, so every
//! scenario exercises validation, mapping resolution, idempotency, and
//! the handshake state machine exactly as deployed code does.

mod support;

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde_json::{Value, json};

use relay_backend::Trace;
use relay_backend::domain::{
    HandshakePolicy, HandshakeService, KitchenOrderService, OrderRelayService,
    RegistrationService,
};
use relay_backend::inbound::http::handshake::{
    list_pending_handshakes, respond_handshake, submit_handshake,
};
use relay_backend::inbound::http::orders::{list_orders, receive_order, update_order_status};
use relay_backend::inbound::http::registration::register_restaurant;
use relay_backend::inbound::http::state::{HttpState, HttpStatePorts};

use support::{MemoryRelayStore, MutableClock};

const REQUESTER_ADDR: &str = "203.0.113.7:51432";

fn epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

struct Relay {
    store: MemoryRelayStore,
    clock: Arc<MutableClock>,
}

impl Relay {
    fn new() -> Self {
        Self {
            store: MemoryRelayStore::new(),
            clock: Arc::new(MutableClock::at(epoch())),
        }
    }

    fn app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let store = Arc::new(self.store.clone());
        let clock: Arc<dyn Clock> = self.clock.clone();

        let handshake_service = Arc::new(HandshakeService::new(
            store.clone(),
            store.clone(),
            HandshakePolicy::default(),
            clock.clone(),
        ));
        let kitchen_service = Arc::new(KitchenOrderService::new(store.clone()));
        let state = HttpState::new(HttpStatePorts {
            registration: Arc::new(RegistrationService::new(store.clone(), clock.clone())),
            handshake: handshake_service.clone(),
            handshake_query: handshake_service,
            order_relay: Arc::new(OrderRelayService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                clock,
            )),
            order_status: kitchen_service.clone(),
            orders_query: kitchen_service,
        });

        App::new().app_data(web::Data::new(state)).wrap(Trace).service(
            web::scope("/api/v1")
                .service(register_restaurant)
                .service(submit_handshake)
                .service(list_pending_handshakes)
                .service(respond_handshake)
                .service(receive_order)
                .service(list_orders)
                .service(update_order_status),
        )
    }
}

async fn post_json(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse,
        Error = actix_web::Error,
    >,
    uri: &str,
    payload: Value,
) -> ServiceResponse {
    let request = actix_test::TestRequest::post()
        .uri(uri)
        .peer_addr(REQUESTER_ADDR.parse::<SocketAddr>().expect("valid addr"))
        .set_json(payload)
        .to_request();
    actix_test::call_service(app, request).await
}

async fn get(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse,
        Error = actix_web::Error,
    >,
    uri: &str,
) -> ServiceResponse {
    let request = actix_test::TestRequest::get().uri(uri).to_request();
    actix_test::call_service(app, request).await
}

fn registration_payload(website_id: &str) -> Value {
    json!({
        "website_restaurant_id": website_id,
        "restaurant_name": "Trattoria Bella",
        "restaurant_phone": "+44 20 7946 0123",
        "restaurant_email": "orders@bella.example",
        "restaurant_address": "1 Market Square",
        "callback_url": "https://bella.example/hook"
    })
}

fn order_payload(website_id: &str, key: &str, amount: &str) -> Value {
    json!({
        "website_restaurant_id": website_id,
        "orderNumber": "WEB-1042",
        "amount": amount,
        "currency": "EUR",
        "items": [
            { "name": "Margherita", "quantity": 2, "customizations": ["extra basil"] }
        ],
        "user": { "name": "Ada", "phone": "+44 20 7946 0456", "address": "2 Castle Row" },
        "idempotency_key": key
    })
}

/// Register a restaurant, run the handshake, and accept it, returning the
/// issued restaurant uid.
async fn onboard(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse,
        Error = actix_web::Error,
    >,
    website_id: &str,
) -> String {
    let response = post_json(app, "/api/v1/register", registration_payload(website_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    let uid = body["app_restaurant_uid"]
        .as_str()
        .expect("uid present")
        .to_owned();

    // Direct the handshake at the freshly issued uid so re-onboarding a
    // website does not get routed at the superseded kitchen.
    let response = post_json(
        app,
        "/api/v1/handshake",
        json!({
            "website_restaurant_id": website_id,
            "callback_url": "https://bella.example/hook",
            "target_restaurant_uid": uid
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    let handshake_id = body["handshake_request_id"]
        .as_str()
        .expect("handshake id present")
        .to_owned();

    let response = post_json(
        app,
        &format!("/api/v1/handshake/{handshake_id}/respond"),
        json!({ "app_restaurant_uid": uid, "accept": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["status"], "completed");

    uid
}

#[actix_web::test]
async fn full_relay_flow_routes_orders_to_the_registered_kitchen() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;

    let uid = onboard(&app, "165").await;

    let mapping = relay.store.active_mapping("165").expect("mapping active");
    assert_eq!(mapping.restaurant_uid.to_string(), uid);
    assert!(mapping.handshake_request_id.is_some());

    let response = post_json(
        &app,
        "/api/v1/orders/receive",
        order_payload("165", "order-165-0001", "23.90"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["restaurant_uid"], json!(uid));

    let stored = relay
        .store
        .order_by_key("order-165-0001")
        .expect("order stored");
    assert_eq!(stored.restaurant_uid.to_string(), uid);
    assert_eq!(stored.website_restaurant_id.as_str(), "165");
    assert_eq!(stored.money.minor, 2390);

    let response = get(&app, &format!("/api/v1/orders?restaurant_uid={uid}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["orders"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn orders_for_unmapped_websites_are_rejected_without_storage() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;

    let response = post_json(
        &app,
        "/api/v1/orders/receive",
        order_payload("999", "order-999-0001", "10.00"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(response).await;
    assert!(
        body["message"]
            .as_str()
            .expect("message present")
            .contains("handshake")
    );
    assert_eq!(relay.store.order_count(), 0);
}

#[actix_web::test]
async fn duplicate_idempotency_keys_store_exactly_one_order() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;
    let _uid = onboard(&app, "165").await;

    let first = post_json(
        &app,
        "/api/v1/orders/receive",
        order_payload("165", "abc", "23.90"),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first_body: Value = actix_test::read_body_json(first).await;

    let second = post_json(
        &app,
        "/api/v1/orders/receive",
        order_payload("165", "abc", "23.90"),
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);
    let second_body: Value = actix_test::read_body_json(second).await;

    assert_eq!(first_body["order_id"], second_body["order_id"]);
    assert_eq!(second_body["created"], json!(false));
    assert_eq!(relay.store.order_count(), 1);
}

#[actix_web::test]
async fn reused_keys_with_a_different_payload_are_conflicts() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;
    let _uid = onboard(&app, "165").await;

    let first = post_json(
        &app,
        "/api/v1/orders/receive",
        order_payload("165", "abc", "23.90"),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(
        &app,
        "/api/v1/orders/receive",
        order_payload("165", "abc", "99.00"),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(relay.store.order_count(), 1);
}

#[actix_web::test]
async fn asserted_uids_must_match_the_active_mapping() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;
    let _uid = onboard(&app, "165").await;

    let mut payload = order_payload("165", "order-165-0002", "23.90");
    payload["app_restaurant_uid"] = json!(uuid::Uuid::new_v4().to_string());
    let response = post_json(&app, "/api/v1/orders/receive", payload).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(relay.store.order_count(), 0);
}

#[actix_web::test]
async fn eleventh_handshake_within_the_window_is_rate_limited() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;

    for n in 0..10 {
        let response = post_json(
            &app,
            "/api/v1/handshake",
            json!({
                "website_restaurant_id": format!("site-{n}"),
                "callback_url": "https://bella.example/hook"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "request {n} admitted");
    }

    let response = post_json(
        &app,
        "/api/v1/handshake",
        json!({
            "website_restaurant_id": "site-overflow",
            "callback_url": "https://bella.example/hook"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok()),
        Some("3600")
    );
}

#[actix_web::test]
async fn duplicate_pending_handshakes_conflict_with_the_winner() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;

    let payload = json!({
        "website_restaurant_id": "165",
        "callback_url": "https://bella.example/hook"
    });
    let first = post_json(&app, "/api/v1/handshake", payload.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first_body: Value = actix_test::read_body_json(first).await;

    let second = post_json(&app, "/api/v1/handshake", payload).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let second_body: Value = actix_test::read_body_json(second).await;
    assert_eq!(
        second_body["details"]["handshake_request_id"],
        first_body["handshake_request_id"]
    );
}

#[actix_web::test]
async fn expired_handshakes_are_terminal_and_unblock_resubmission() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;

    let response = post_json(&app, "/api/v1/register", registration_payload("165")).await;
    let body: Value = actix_test::read_body_json(response).await;
    let uid = body["app_restaurant_uid"].as_str().expect("uid").to_owned();

    let response = post_json(
        &app,
        "/api/v1/handshake",
        json!({
            "website_restaurant_id": "165",
            "callback_url": "https://bella.example/hook"
        }),
    )
    .await;
    let body: Value = actix_test::read_body_json(response).await;
    let stale_id = body["handshake_request_id"].as_str().expect("id").to_owned();

    relay.clock.advance(Duration::minutes(11));

    let response = post_json(
        &app,
        &format!("/api/v1/handshake/{stale_id}/respond"),
        json!({ "app_restaurant_uid": uid, "accept": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(relay.store.active_mapping("165").is_none());

    // The stale request no longer blocks a fresh submission.
    let response = post_json(
        &app,
        "/api/v1/handshake",
        json!({
            "website_restaurant_id": "165",
            "callback_url": "https://bella.example/hook"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn kitchen_status_transitions_follow_the_lifecycle() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;
    let _uid = onboard(&app, "165").await;

    let response = post_json(
        &app,
        "/api/v1/orders/receive",
        order_payload("165", "order-165-0003", "23.90"),
    )
    .await;
    let body: Value = actix_test::read_body_json(response).await;
    let order_id = body["order_id"].as_str().expect("order id").to_owned();

    // pending -> completed skips triage and is refused.
    let response = post_json(
        &app,
        &format!("/api/v1/orders/{order_id}/status"),
        json!({ "status": "completed" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    for (next, expected) in [
        ("approved", StatusCode::OK),
        ("completed", StatusCode::OK),
        ("approved", StatusCode::CONFLICT),
    ] {
        let response = post_json(
            &app,
            &format!("/api/v1/orders/{order_id}/status"),
            json!({ "status": next }),
        )
        .await;
        assert_eq!(response.status(), expected, "transition to {next}");
    }
}

#[actix_web::test]
async fn remapping_keeps_at_most_one_active_mapping() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;

    let first_uid = onboard(&app, "165").await;
    // The restaurant re-registers (new uid) and handshakes again.
    let second_uid = onboard(&app, "165").await;
    assert_ne!(first_uid, second_uid);

    assert_eq!(relay.store.active_mapping_count("165"), 1);
    let mapping = relay.store.active_mapping("165").expect("mapping active");
    assert_eq!(mapping.restaurant_uid.to_string(), second_uid);

    // Orders now route to the new kitchen.
    let response = post_json(
        &app,
        "/api/v1/orders/receive",
        order_payload("165", "order-165-0004", "12.00"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["restaurant_uid"], json!(second_uid));
}

#[actix_web::test]
async fn pending_listing_shows_broadcasts_until_answered() {
    let relay = Relay::new();
    let app = actix_test::init_service(relay.app()).await;

    let response = post_json(&app, "/api/v1/register", registration_payload("165")).await;
    let body: Value = actix_test::read_body_json(response).await;
    let uid = body["app_restaurant_uid"].as_str().expect("uid").to_owned();

    let response = post_json(
        &app,
        "/api/v1/handshake",
        json!({
            "website_restaurant_id": "165",
            "callback_url": "https://bella.example/hook"
        }),
    )
    .await;
    let body: Value = actix_test::read_body_json(response).await;
    let handshake_id = body["handshake_request_id"].as_str().expect("id").to_owned();

    let response = get(&app, &format!("/api/v1/handshake/pending?restaurant_uid={uid}")).await;
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["requests"].as_array().map(Vec::len), Some(1));

    let response = post_json(
        &app,
        &format!("/api/v1/handshake/{handshake_id}/respond"),
        json!({ "app_restaurant_uid": uid, "accept": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["status"], "rejected");
    assert!(relay.store.active_mapping("165").is_none());

    let response = get(&app, &format!("/api/v1/handshake/pending?restaurant_uid={uid}")).await;
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["requests"].as_array().map(Vec::len), Some(0));
}

//! Tests for the order relay HTTP handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use super::*;
use crate::domain::ports::{
    FixtureHandshakeCommand, FixtureHandshakeQuery, FixtureOrderQuery, FixtureOrderRelayCommand,
    FixtureOrderStatusCommand, FixtureRegistrationCommand, MockOrderRelayCommand,
    OrderRelayCommand,
};
use crate::inbound::http::state::HttpStatePorts;

fn test_app_with(
    order_relay: Arc<dyn OrderRelayCommand>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(HttpStatePorts {
        registration: Arc::new(FixtureRegistrationCommand),
        handshake: Arc::new(FixtureHandshakeCommand),
        handshake_query: Arc::new(FixtureHandshakeQuery),
        order_relay,
        order_status: Arc::new(FixtureOrderStatusCommand),
        orders_query: Arc::new(FixtureOrderQuery),
    });
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api/v1")
            .service(receive_order)
            .service(list_orders)
            .service(update_order_status),
    )
}

fn sample_order() -> Value {
    json!({
        "website_restaurant_id": "165",
        "orderNumber": "WEB-1042",
        "amount": "23.90",
        "currency": "EUR",
        "items": [
            { "name": "Margherita", "quantity": 2, "customizations": ["extra basil"] }
        ],
        "user": { "name": "Ada", "phone": "+44 20 7946 0456" },
        "idempotency_key": "abc"
    })
}

#[actix_web::test]
async fn receive_returns_201_for_new_orders() {
    let app = actix_test::init_service(test_app_with(Arc::new(FixtureOrderRelayCommand))).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/orders/receive")
        .set_json(sample_order())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["orderNumber"], "WEB-1042");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["created"], json!(true));
}

#[actix_web::test]
async fn receive_accepts_numeric_amounts() {
    let app = actix_test::init_service(test_app_with(Arc::new(FixtureOrderRelayCommand))).await;

    let mut payload = sample_order();
    payload["amount"] = json!(23.9);
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/orders/receive")
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn receive_replays_return_200_with_the_stored_order() {
    let stored_id = Uuid::new_v4();
    let uid = crate::domain::RestaurantUid::generate();
    let mut mock = MockOrderRelayCommand::new();
    mock.expect_receive().returning(move |_| {
        Ok(ReceiveOrderOutcome::Replayed(OrderReceipt {
            order_id: stored_id,
            order_number: "WEB-1042".to_owned(),
            restaurant_uid: uid,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }))
    });
    let app = actix_test::init_service(test_app_with(Arc::new(mock))).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/orders/receive")
        .set_json(sample_order())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["order_id"], json!(stored_id.to_string()));
    assert_eq!(body["created"], json!(false));
}

#[actix_web::test]
async fn receive_maps_unresolved_mappings_to_404() {
    let mut mock = MockOrderRelayCommand::new();
    mock.expect_receive().returning(|_| {
        Err(crate::domain::Error::not_found(
            "no active mapping for this website restaurant id; complete a handshake first",
        ))
    });
    let app = actix_test::init_service(test_app_with(Arc::new(mock))).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/orders/receive")
        .set_json(sample_order())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn receive_maps_mismatched_uids_to_403() {
    let mut mock = MockOrderRelayCommand::new();
    mock.expect_receive().returning(|_| {
        Err(crate::domain::Error::forbidden(
            "restaurant uid does not match an active mapping for this website restaurant id",
        ))
    });
    let app = actix_test::init_service(test_app_with(Arc::new(mock))).await;

    let mut payload = sample_order();
    payload["app_restaurant_uid"] = json!(Uuid::new_v4().to_string());
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/orders/receive")
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn receive_names_the_missing_idempotency_key() {
    let app = actix_test::init_service(test_app_with(Arc::new(FixtureOrderRelayCommand))).await;

    let mut payload = sample_order();
    payload
        .as_object_mut()
        .expect("payload is an object")
        .remove("idempotency_key");
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/orders/receive")
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], "idempotency_key");
}

#[actix_web::test]
async fn receive_rejects_malformed_amounts() {
    let app = actix_test::init_service(test_app_with(Arc::new(FixtureOrderRelayCommand))).await;

    let mut payload = sample_order();
    payload["amount"] = json!("23.909");
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/orders/receive")
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], "amount");
}

#[actix_web::test]
async fn list_requires_a_restaurant_uid() {
    let app = actix_test::init_service(test_app_with(Arc::new(FixtureOrderRelayCommand))).await;

    let request = actix_test::TestRequest::get()
        .uri("/api/v1/orders")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn update_status_rejects_unknown_statuses() {
    let app = actix_test::init_service(test_app_with(Arc::new(FixtureOrderRelayCommand))).await;

    let id = Uuid::new_v4();
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/orders/{id}/status"))
        .set_json(json!({ "status": "vaporised" }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], "status");
}

#[actix_web::test]
async fn update_status_echoes_the_transition() {
    let app = actix_test::init_service(test_app_with(Arc::new(FixtureOrderRelayCommand))).await;

    let id = Uuid::new_v4();
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/orders/{id}/status"))
        .set_json(json!({ "status": "approved" }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["status"], "approved");
    assert_eq!(body["order_id"], json!(id.to_string()));
}

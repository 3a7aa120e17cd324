//! Tests for the registration HTTP handler.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{
    FixtureHandshakeCommand, FixtureHandshakeQuery, FixtureOrderQuery, FixtureOrderRelayCommand,
    FixtureOrderStatusCommand, FixtureRegistrationCommand,
};
use crate::inbound::http::state::HttpStatePorts;

fn test_app() -> App<
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
        order_relay: Arc::new(FixtureOrderRelayCommand),
        order_status: Arc::new(FixtureOrderStatusCommand),
        orders_query: Arc::new(FixtureOrderQuery),
    });
    App::new()
        .app_data(web::Data::new(state))
        .service(web::scope("/api/v1").service(register_restaurant))
}

fn sample_registration() -> Value {
    json!({
        "website_restaurant_id": "165",
        "restaurant_name": "Trattoria Bella",
        "restaurant_phone": "+44 20 7946 0123",
        "restaurant_email": "orders@bella.example",
        "restaurant_address": "1 Market Square",
        "callback_url": "https://bella.example/hook"
    })
}

#[actix_web::test]
async fn register_returns_a_capability_uid() {
    let app = actix_test::init_service(test_app()).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/register")
        .set_json(sample_registration())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["website_restaurant_id"], "165");
    let uid = body["app_restaurant_uid"].as_str().expect("uid present");
    uuid::Uuid::parse_str(uid).expect("uid is a UUID");
}

#[actix_web::test]
async fn register_names_the_missing_field() {
    let app = actix_test::init_service(test_app()).await;

    let mut payload = sample_registration();
    payload
        .as_object_mut()
        .expect("payload is an object")
        .remove("restaurant_phone");
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/register")
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], "restaurant_phone");
    assert_eq!(body["code"], "invalid_request");
}

#[actix_web::test]
async fn register_rejects_malformed_callback_urls() {
    let app = actix_test::init_service(test_app()).await;

    let mut payload = sample_registration();
    payload["callback_url"] = json!("orders/hook");
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/register")
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], "callback_url");
}

#[actix_web::test]
async fn register_treats_blank_fields_as_missing() {
    let app = actix_test::init_service(test_app()).await;

    let mut payload = sample_registration();
    payload["restaurant_name"] = json!("   ");
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/register")
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], "restaurant_name");
}

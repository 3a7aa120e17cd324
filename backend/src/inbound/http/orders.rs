//! Order relay and kitchen order HTTP handlers.
//!
//! ```text
//! POST /api/v1/orders/receive
//! GET  /api/v1/orders
//! POST /api/v1/orders/{id}/status
//! ```
//!
//! The receive handler deserialises from a raw JSON value so the payload
//! can be fingerprinted exactly as submitted before field validation.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use utoipa::ToSchema;

use crate::domain::ports::{
    ListOrdersRequest, OrderReceipt, ReceiveOrderOutcome, ReceiveOrderRequest,
    UpdateOrderStatusRequest,
};
use crate::domain::{
    Currency, Customer, Error, Money, Order, OrderDraft, OrderItem, OrderStatus, RestaurantUid,
    canonicalize_and_hash,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_callback_url, parse_idempotency_key, parse_uuid,
    parse_website_restaurant_id, require_field,
};

/// Decimal amount accepted as either a JSON number or a string.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AmountBody {
    /// `"12.30"`
    Text(String),
    /// `12.30`
    #[schema(value_type = f64)]
    Number(serde_json::Number),
}

impl AmountBody {
    fn into_decimal_string(self) -> String {
        match self {
            Self::Text(raw) => raw,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// One line item as submitted by the website.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderItemBody {
    /// Menu item name.
    pub name: String,
    /// Number of units; defaults to 1.
    pub quantity: Option<u32>,
    /// Per-unit price in minor units, when the website itemises prices.
    pub unit_price_minor: Option<i64>,
    /// Free-form customisations.
    #[serde(default)]
    pub customizations: Vec<String>,
}

/// Customer details as submitted by the website.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CustomerBody {
    /// Customer name.
    pub name: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Contact email address.
    pub email: Option<String>,
    /// Delivery address.
    pub address: Option<String>,
}

/// Request payload for relaying an order.
///
/// Field names follow the website integration contract, which mixes
/// `orderNumber` with snake_case identifiers.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReceiveOrderBody {
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: Option<String>,
    /// Caller-asserted kitchen uid, verified against the active mapping.
    #[schema(format = "uuid")]
    pub app_restaurant_uid: Option<String>,
    /// Website-side order number.
    #[serde(rename = "orderNumber")]
    pub order_number: Option<String>,
    /// Order total as a decimal number or string.
    pub amount: Option<AmountBody>,
    /// ISO 4217 style currency code.
    pub currency: Option<String>,
    /// Line items.
    #[serde(default)]
    pub items: Vec<OrderItemBody>,
    /// Customer contact and delivery details.
    pub user: Option<CustomerBody>,
    /// Optional per-order callback endpoint.
    pub callback_url: Option<String>,
    /// Caller-supplied replay token.
    pub idempotency_key: Option<String>,
}

/// Response payload echoing a stored order's key fields.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderReceiptBody {
    /// Always `true` on this arm; errors use the shared envelope.
    pub success: bool,
    /// Row identifier.
    #[schema(format = "uuid")]
    pub order_id: String,
    /// Website-side order number.
    #[serde(rename = "orderNumber")]
    pub order_number: String,
    /// The kitchen the order was routed to.
    #[schema(format = "uuid")]
    pub restaurant_uid: String,
    /// Lifecycle state.
    pub status: String,
    /// Receipt timestamp (RFC 3339).
    #[schema(format = "date-time")]
    pub created_at: String,
    /// `false` when an idempotent replay returned the stored order.
    pub created: bool,
}

impl OrderReceiptBody {
    fn new(receipt: &OrderReceipt, created: bool) -> Self {
        Self {
            success: true,
            order_id: receipt.order_id.to_string(),
            order_number: receipt.order_number.clone(),
            restaurant_uid: receipt.restaurant_uid.to_string(),
            status: receipt.status.to_string(),
            created_at: receipt.created_at.to_rfc3339(),
            created,
        }
    }
}

fn parse_items(items: Vec<OrderItemBody>) -> Vec<OrderItem> {
    items
        .into_iter()
        .map(|item| OrderItem {
            name: item.name,
            quantity: item.quantity.unwrap_or(1),
            unit_price_minor: item.unit_price_minor,
            customizations: item.customizations,
        })
        .collect()
}

fn parse_customer(user: Option<CustomerBody>) -> Result<Customer, Error> {
    let user = user.ok_or_else(|| {
        crate::inbound::http::validation::missing_field_error(FieldName::new("user"))
    })?;
    let name = require_field(user.name, FieldName::new("user.name"))?;
    Ok(Customer {
        name,
        phone: user.phone,
        email: user.email,
        address: user.address,
    })
}

fn parse_order(body: ReceiveOrderBody, payload: &serde_json::Value) -> Result<OrderDraft, Error> {
    let website_restaurant_id = require_field(
        body.website_restaurant_id,
        FieldName::new("website_restaurant_id"),
    )?;
    let website_restaurant_id = parse_website_restaurant_id(
        website_restaurant_id,
        FieldName::new("website_restaurant_id"),
    )?;
    let asserted_restaurant_uid = body
        .app_restaurant_uid
        .map(|raw| parse_uuid(&raw, FieldName::new("app_restaurant_uid")))
        .transpose()?
        .map(RestaurantUid::from_uuid);
    let order_number = require_field(body.order_number, FieldName::new("orderNumber"))?;
    let currency = require_field(body.currency, FieldName::new("currency"))?;
    let currency = Currency::new(&currency).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(serde_json::json!({ "field": "currency" }))
    })?;
    let amount = body
        .amount
        .ok_or_else(|| {
            crate::inbound::http::validation::missing_field_error(FieldName::new("amount"))
        })?
        .into_decimal_string();
    let money = Money::parse(&amount, currency).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(serde_json::json!({ "field": "amount", "value": amount }))
    })?;
    let customer = parse_customer(body.user)?;
    let callback_url = body
        .callback_url
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_callback_url(&raw, FieldName::new("callback_url")))
        .transpose()?;
    let idempotency_key = require_field(body.idempotency_key, FieldName::new("idempotency_key"))?;
    let idempotency_key =
        parse_idempotency_key(idempotency_key, FieldName::new("idempotency_key"))?;
    let payload_hash = canonicalize_and_hash(payload)
        .map_err(|err| Error::internal(format!("payload fingerprint failed: {err}")))?;

    Ok(OrderDraft {
        website_restaurant_id,
        asserted_restaurant_uid,
        order_number,
        money,
        items: parse_items(body.items),
        customer,
        callback_url,
        idempotency_key,
        payload_hash,
    })
}

/// Accept an inbound order and route it to the mapped kitchen.
///
/// Replaying a previously used idempotency key with the same payload
/// returns the stored order with 200 instead of creating a duplicate.
#[utoipa::path(
    post,
    path = "/api/v1/orders/receive",
    request_body = ReceiveOrderBody,
    responses(
        (status = 201, description = "Order stored", body = OrderReceiptBody),
        (status = 200, description = "Idempotent replay of a stored order", body = OrderReceiptBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Mapping inactive or mismatched", body = ErrorSchema),
        (status = 404, description = "No active mapping or restaurant", body = ErrorSchema),
        (status = 409, description = "Idempotency key reused with a different payload", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "receiveOrder"
)]
#[post("/orders/receive")]
pub async fn receive_order(
    state: web::Data<HttpState>,
    payload: web::Json<serde_json::Value>,
) -> ApiResult<HttpResponse> {
    let raw = payload.into_inner();
    let body: ReceiveOrderBody = serde_json::from_value(raw.clone())
        .map_err(|err| Error::invalid_request(format!("malformed order payload: {err}")))?;
    let draft = parse_order(body, &raw)?;

    let outcome = state
        .order_relay
        .receive(ReceiveOrderRequest { draft })
        .await?;

    let response = match outcome {
        ReceiveOrderOutcome::Created(receipt) => {
            HttpResponse::Created().json(OrderReceiptBody::new(&receipt, true))
        }
        ReceiveOrderOutcome::Replayed(receipt) => {
            HttpResponse::Ok().json(OrderReceiptBody::new(&receipt, false))
        }
    };
    Ok(response)
}

/// Query string for the kitchen order board.
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    /// The polling kitchen's uid.
    pub restaurant_uid: Option<String>,
    /// Optional cap on the number of rows returned.
    pub limit: Option<i64>,
}

/// One order on the kitchen board.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderBody {
    /// Row identifier.
    #[schema(format = "uuid")]
    pub order_id: String,
    /// Website-side order number.
    #[serde(rename = "orderNumber")]
    pub order_number: String,
    /// Normalised decimal total.
    pub amount: String,
    /// ISO 4217 style currency code.
    pub currency: String,
    /// Lifecycle state.
    pub status: String,
    /// Line items.
    pub items: Vec<OrderItemBody>,
    /// Customer contact and delivery details.
    pub user: CustomerBody,
    /// Originating website identifier.
    pub website_restaurant_id: String,
    /// Receipt timestamp (RFC 3339).
    #[schema(format = "date-time")]
    pub created_at: String,
}

impl From<Order> for OrderBody {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id.to_string(),
            order_number: order.order_number,
            amount: order.money.display,
            currency: order.money.currency.to_string(),
            status: order.status.to_string(),
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemBody {
                    name: item.name,
                    quantity: Some(item.quantity),
                    unit_price_minor: item.unit_price_minor,
                    customizations: item.customizations,
                })
                .collect(),
            user: CustomerBody {
                name: Some(order.customer.name),
                phone: order.customer.phone,
                email: order.customer.email,
                address: order.customer.address,
            },
            website_restaurant_id: order.website_restaurant_id.to_string(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// Response payload for the kitchen order board.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListOrdersBody {
    /// Orders, newest first.
    pub orders: Vec<OrderBody>,
}

/// Orders scoped to one kitchen, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(
        ("restaurant_uid" = String, Query, description = "The polling kitchen's uid"),
        ("limit" = Option<i64>, Query, description = "Cap on the number of rows returned")
    ),
    responses(
        (status = 200, description = "Orders for the kitchen", body = ListOrdersBody),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "listOrders"
)]
#[get("/orders")]
pub async fn list_orders(
    state: web::Data<HttpState>,
    query: web::Query<ListOrdersQuery>,
) -> ApiResult<web::Json<ListOrdersBody>> {
    let query = query.into_inner();
    let raw_uid = require_field(query.restaurant_uid, FieldName::new("restaurant_uid"))?;
    let restaurant_uid =
        RestaurantUid::from_uuid(parse_uuid(&raw_uid, FieldName::new("restaurant_uid"))?);

    let response = state
        .orders_query
        .list_for_restaurant(ListOrdersRequest {
            restaurant_uid,
            limit: query.limit,
        })
        .await?;

    Ok(web::Json(ListOrdersBody {
        orders: response.orders.into_iter().map(Into::into).collect(),
    }))
}

/// Request payload for a kitchen-side status transition.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateOrderStatusBody {
    /// Desired state: `approved`, `cancelled`, or `completed`.
    pub status: Option<String>,
}

/// Response payload after a status transition.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpdateOrderStatusResponseBody {
    /// Always `true` on this arm; errors use the shared envelope.
    pub success: bool,
    /// The order that moved.
    #[schema(format = "uuid")]
    pub order_id: String,
    /// State after the transition.
    pub status: String,
}

/// Move an order along its kitchen lifecycle.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/status",
    params(
        ("id" = String, Path, description = "Order identifier")
    ),
    request_body = UpdateOrderStatusBody,
    responses(
        (status = 200, description = "Status updated", body = UpdateOrderStatusResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Unknown order", body = ErrorSchema),
        (status = 409, description = "Illegal transition", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "updateOrderStatus"
)]
#[post("/orders/{id}/status")]
pub async fn update_order_status(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateOrderStatusBody>,
) -> ApiResult<web::Json<UpdateOrderStatusResponseBody>> {
    let raw_status = require_field(payload.into_inner().status, FieldName::new("status"))?;
    let next_status: OrderStatus = raw_status.parse().map_err(|err: crate::domain::ParseOrderStatusError| {
        Error::invalid_request(err.to_string())
            .with_details(serde_json::json!({ "field": "status", "value": raw_status }))
    })?;

    let response = state
        .order_status
        .update_status(UpdateOrderStatusRequest {
            order_id: path.into_inner(),
            next_status,
        })
        .await?;

    Ok(web::Json(UpdateOrderStatusResponseBody {
        success: true,
        order_id: response.order_id.to_string(),
        status: response.status.to_string(),
    }))
}

#[cfg(test)]
#[path = "orders_tests.rs"]
mod tests;

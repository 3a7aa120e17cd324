//! Handshake HTTP handlers.
//!
//! ```text
//! POST /api/v1/handshake
//! GET  /api/v1/handshake/pending
//! POST /api/v1/handshake/{id}/respond
//! ```

use actix_web::http::header;
use actix_web::{HttpRequest, get, post, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use utoipa::ToSchema;

use crate::domain::ports::{
    ListPendingHandshakesRequest, PendingHandshake, RespondHandshakeRequest,
    SubmitHandshakeRequest, SubmitHandshakeResponse,
};
use crate::domain::{HandshakeDraft, RequesterInfo, RestaurantUid};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_callback_url, parse_uuid, parse_website_restaurant_id, require_field,
};

/// Request payload for opening a handshake.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct HandshakeRequestBody {
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: Option<String>,
    /// Absolute http(s) callback endpoint.
    pub callback_url: Option<String>,
    /// Explicit domain override; defaults to the callback host.
    pub website_domain: Option<String>,
    /// Kitchen to direct the request at; omitted requests resolve against
    /// the active mapping or fall back to a broadcast.
    #[schema(format = "uuid")]
    pub target_restaurant_uid: Option<String>,
}

/// Response payload after a handshake was opened.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HandshakeResponseBody {
    /// Always `true` on this arm; errors use the shared envelope.
    pub success: bool,
    /// Identifier the website polls with.
    #[schema(format = "uuid")]
    pub handshake_request_id: String,
    /// Delivery note; distinguishes targeted from broadcast delivery.
    pub message: String,
    /// Rough guidance for the caller's polling cadence.
    pub estimated_response_time: String,
}

impl From<SubmitHandshakeResponse> for HandshakeResponseBody {
    fn from(value: SubmitHandshakeResponse) -> Self {
        Self {
            success: true,
            handshake_request_id: value.handshake_request_id.to_string(),
            message: value.message,
            estimated_response_time: value.estimated_response_time,
        }
    }
}

/// Requester identity extracted from the HTTP layer.
fn requester_info(req: &HttpRequest) -> RequesterInfo {
    let ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_owned();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    RequesterInfo { ip, user_agent }
}

fn parse_handshake(
    body: HandshakeRequestBody,
    requester: RequesterInfo,
) -> Result<HandshakeDraft, crate::domain::Error> {
    let website_restaurant_id = require_field(
        body.website_restaurant_id,
        FieldName::new("website_restaurant_id"),
    )?;
    let website_restaurant_id = parse_website_restaurant_id(
        website_restaurant_id,
        FieldName::new("website_restaurant_id"),
    )?;
    let callback_url = require_field(body.callback_url, FieldName::new("callback_url"))?;
    let callback_url = parse_callback_url(&callback_url, FieldName::new("callback_url"))?;
    let target_restaurant_uid = body
        .target_restaurant_uid
        .map(|raw| parse_uuid(&raw, FieldName::new("target_restaurant_uid")))
        .transpose()?
        .map(RestaurantUid::from_uuid);

    Ok(HandshakeDraft {
        website_restaurant_id,
        callback_url,
        website_domain: body.website_domain.filter(|domain| !domain.trim().is_empty()),
        target_restaurant_uid,
        requester,
    })
}

/// Open a handshake request binding a website restaurant id to a kitchen.
#[utoipa::path(
    post,
    path = "/api/v1/handshake",
    request_body = HandshakeRequestBody,
    responses(
        (status = 200, description = "Handshake request opened", body = HandshakeResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "A pending handshake already exists", body = ErrorSchema),
        (status = 429, description = "Rate limited; see Retry-After", body = ErrorSchema)
    ),
    tags = ["handshake"],
    operation_id = "submitHandshake"
)]
#[post("/handshake")]
pub async fn submit_handshake(
    state: web::Data<HttpState>,
    req: HttpRequest,
    payload: web::Json<HandshakeRequestBody>,
) -> ApiResult<web::Json<HandshakeResponseBody>> {
    let draft = parse_handshake(payload.into_inner(), requester_info(&req))?;

    let response = state
        .handshake
        .submit(SubmitHandshakeRequest { draft })
        .await?;

    Ok(web::Json(HandshakeResponseBody::from(response)))
}

/// Query string for kitchen-side handshake polling.
#[derive(Debug, Deserialize)]
pub struct PendingHandshakesQuery {
    /// The polling kitchen's uid.
    pub restaurant_uid: Option<String>,
}

/// One pending handshake as seen by a polling kitchen.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingHandshakeBody {
    /// Request identifier.
    #[schema(format = "uuid")]
    pub handshake_request_id: String,
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: String,
    /// Requesting website domain.
    pub website_domain: String,
    /// Callback endpoint to confirm against.
    pub callback_url: String,
    /// Whether the request was directed at this kitchen specifically.
    pub targeted: bool,
    /// Submission timestamp (RFC 3339).
    #[schema(format = "date-time")]
    pub created_at: String,
    /// Response deadline (RFC 3339).
    #[schema(format = "date-time")]
    pub expires_at: String,
}

impl From<PendingHandshake> for PendingHandshakeBody {
    fn from(value: PendingHandshake) -> Self {
        Self {
            handshake_request_id: value.id.to_string(),
            website_restaurant_id: value.website_restaurant_id,
            website_domain: value.website_domain,
            callback_url: value.callback_url,
            targeted: value.targeted,
            created_at: value.created_at.to_rfc3339(),
            expires_at: value.expires_at.to_rfc3339(),
        }
    }
}

/// Response payload for kitchen-side handshake polling.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingHandshakesBody {
    /// Unexpired pending requests, oldest first.
    pub requests: Vec<PendingHandshakeBody>,
}

/// Pending handshakes addressed to a kitchen (targeted or broadcast).
#[utoipa::path(
    get,
    path = "/api/v1/handshake/pending",
    params(
        ("restaurant_uid" = String, Query, description = "The polling kitchen's uid")
    ),
    responses(
        (status = 200, description = "Pending handshakes", body = PendingHandshakesBody),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["handshake"],
    operation_id = "listPendingHandshakes"
)]
#[get("/handshake/pending")]
pub async fn list_pending_handshakes(
    state: web::Data<HttpState>,
    query: web::Query<PendingHandshakesQuery>,
) -> ApiResult<web::Json<PendingHandshakesBody>> {
    let raw_uid = require_field(
        query.into_inner().restaurant_uid,
        FieldName::new("restaurant_uid"),
    )?;
    let restaurant_uid =
        RestaurantUid::from_uuid(parse_uuid(&raw_uid, FieldName::new("restaurant_uid"))?);

    let response = state
        .handshake_query
        .list_pending(ListPendingHandshakesRequest { restaurant_uid })
        .await?;

    Ok(web::Json(PendingHandshakesBody {
        requests: response.requests.into_iter().map(Into::into).collect(),
    }))
}

/// Request payload for answering a handshake.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RespondHandshakeBody {
    /// The responding kitchen's uid.
    #[schema(format = "uuid")]
    pub app_restaurant_uid: Option<String>,
    /// `true` accepts and activates the mapping; `false` rejects.
    pub accept: Option<bool>,
}

/// Response payload after a handshake was answered.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RespondResponseBody {
    /// Always `true` on this arm; errors use the shared envelope.
    pub success: bool,
    /// Terminal state the request moved to.
    pub status: String,
    /// The mapping activated on acceptance.
    #[schema(format = "uuid")]
    pub mapping_id: Option<String>,
}

/// Answer a pending handshake, activating the mapping on acceptance.
#[utoipa::path(
    post,
    path = "/api/v1/handshake/{id}/respond",
    params(
        ("id" = String, Path, description = "Handshake request identifier")
    ),
    request_body = RespondHandshakeBody,
    responses(
        (status = 200, description = "Handshake answered", body = RespondResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Directed at a different restaurant", body = ErrorSchema),
        (status = 404, description = "Unknown handshake request", body = ErrorSchema),
        (status = 409, description = "Already answered or expired", body = ErrorSchema)
    ),
    tags = ["handshake"],
    operation_id = "respondHandshake"
)]
#[post("/handshake/{id}/respond")]
pub async fn respond_handshake(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
    payload: web::Json<RespondHandshakeBody>,
) -> ApiResult<web::Json<RespondResponseBody>> {
    let body = payload.into_inner();
    let raw_uid = require_field(body.app_restaurant_uid, FieldName::new("app_restaurant_uid"))?;
    let restaurant_uid =
        RestaurantUid::from_uuid(parse_uuid(&raw_uid, FieldName::new("app_restaurant_uid"))?);
    let accept = body.accept.unwrap_or(true);

    let response = state
        .handshake
        .respond(RespondHandshakeRequest {
            handshake_request_id: path.into_inner(),
            restaurant_uid,
            accept,
        })
        .await?;

    Ok(web::Json(RespondResponseBody {
        success: true,
        status: response.status.to_string(),
        mapping_id: response.mapping_id.map(|id| id.to_string()),
    }))
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;

//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module registers the schemas required for OpenAPI documentation using
//! utoipa's external schema registration.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The caller presented an identifier it is not entitled to use.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource or mapping does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with existing state.
    #[schema(rename = "conflict")]
    Conflict,
    /// The caller exceeded the request budget.
    #[schema(rename = "rate_limited")]
    RateLimited,
    /// A backing store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "missing required field: callback_url")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Seconds the caller should wait before retrying.
    #[schema(example = 3600)]
    retry_after_secs: Option<u64>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}

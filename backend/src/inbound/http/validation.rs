//! Shared validation helpers for inbound HTTP adapters.
//!
//! Validation failures name the offending field in structured details so
//! integrators can fix payloads without guesswork.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{CallbackUrl, Error, IdempotencyKey, WebsiteRestaurantId};

/// Validation error codes attached to HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidUrl,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidUrl => "invalid_url",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("missing required field: {name}"),
        ErrorCode::MissingField,
    )
}

/// Require a field to be present and non-blank. Blank strings count as
/// missing so the error can still name the field.
pub(crate) fn require_field(
    value: Option<String>,
    field: FieldName,
) -> Result<String, Error> {
    match value {
        Some(raw) if !raw.trim().is_empty() => Ok(raw),
        _ => Err(missing_field_error(field)),
    }
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        let name = field.as_str();
        field_error(
            field,
            format!("{name} must be a valid UUID"),
            ErrorCode::InvalidUuid,
        )
    })
}

pub(crate) fn parse_callback_url(value: &str, field: FieldName) -> Result<CallbackUrl, Error> {
    CallbackUrl::parse(value).map_err(|err| {
        let name = field.as_str();
        field_error(field, format!("{name}: {err}"), ErrorCode::InvalidUrl)
    })
}

pub(crate) fn parse_website_restaurant_id(
    value: String,
    field: FieldName,
) -> Result<WebsiteRestaurantId, Error> {
    WebsiteRestaurantId::new(value).map_err(|err| {
        let name = field.as_str();
        field_error(field, format!("{name}: {err}"), ErrorCode::InvalidValue)
    })
}

pub(crate) fn parse_idempotency_key(
    value: String,
    field: FieldName,
) -> Result<IdempotencyKey, Error> {
    IdempotencyKey::new(value).map_err(|err| {
        let name = field.as_str();
        field_error(field, format!("{name}: {err}"), ErrorCode::InvalidValue)
    })
}

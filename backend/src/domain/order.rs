//! Order aggregate relayed from a website to a kitchen.
//!
//! Monetary amounts are kept in integer minor units alongside the normalised
//! decimal string the caller sent, so no floating-point arithmetic touches
//! money anywhere in the relay.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    CallbackUrl, IdempotencyKey, PayloadHash, RestaurantUid, WebsiteRestaurantId,
};

/// ISO 4217 style currency code (three ASCII letters, stored uppercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

/// Validation errors for [`Currency`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("currency must be a three-letter code, got {value:?}")]
pub struct CurrencyValidationError {
    /// The rejected input.
    pub value: String,
}

impl Currency {
    /// Validate and normalise a currency code.
    ///
    /// # Errors
    ///
    /// Rejects anything but three ASCII letters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CurrencyValidationError> {
        let raw = raw.as_ref();
        if raw.len() == 3 && raw.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(raw.to_ascii_uppercase()))
        } else {
            Err(CurrencyValidationError {
                value: raw.to_owned(),
            })
        }
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validation errors for [`Money`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyValidationError {
    /// The amount string is not a non-negative decimal with at most two
    /// fractional digits.
    #[error("amount must be a non-negative decimal with at most two fractional digits")]
    MalformedAmount,
    /// The amount exceeds what fits in 64-bit minor units.
    #[error("amount out of range")]
    OutOfRange,
}

/// A monetary amount in integer minor units with its display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (e.g. cents).
    pub minor: i64,
    /// Currency code.
    pub currency: Currency,
    /// Normalised decimal string, always with two fractional digits.
    pub display: String,
}

impl Money {
    /// Parse a decimal amount string into minor units.
    ///
    /// Accepts `"12"`, `"12.3"`, and `"12.34"`; the display form is
    /// normalised to two fractional digits. The conversion uses checked
    /// integer arithmetic only.
    ///
    /// # Errors
    ///
    /// Rejects negative, malformed, or out-of-range amounts.
    ///
    /// # Examples
    /// ```
    /// use relay_backend::domain::{Currency, Money};
    ///
    /// let eur = Currency::new("EUR").expect("valid code");
    /// let money = Money::parse("12.3", eur).expect("valid amount");
    /// assert_eq!(money.minor, 1230);
    /// assert_eq!(money.display, "12.30");
    /// ```
    pub fn parse(amount: &str, currency: Currency) -> Result<Self, MoneyValidationError> {
        let amount = amount.trim();
        let (whole, fraction) = match amount.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (amount, ""),
        };
        if whole.is_empty() || whole.chars().any(|c| !c.is_ascii_digit()) {
            return Err(MoneyValidationError::MalformedAmount);
        }
        if fraction.len() > 2 || fraction.chars().any(|c| !c.is_ascii_digit()) {
            return Err(MoneyValidationError::MalformedAmount);
        }

        let whole_units: i64 = whole
            .parse()
            .map_err(|_| MoneyValidationError::OutOfRange)?;
        let mut fraction_padded = fraction.to_owned();
        while fraction_padded.len() < 2 {
            fraction_padded.push('0');
        }
        let fraction_units: i64 = fraction_padded
            .parse()
            .map_err(|_| MoneyValidationError::MalformedAmount)?;

        let minor = whole_units
            .checked_mul(100)
            .and_then(|units| units.checked_add(fraction_units))
            .ok_or(MoneyValidationError::OutOfRange)?;

        Ok(Self {
            minor,
            currency,
            display: format!("{whole_units}.{fraction_padded}"),
        })
    }

    /// Display form combined with the currency, e.g. `"12.30 EUR"`.
    #[must_use]
    pub fn display_with_currency(&self) -> String {
        format!("{} {}", self.display, self.currency)
    }
}

/// Kitchen-facing lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Received from the website, awaiting kitchen triage.
    Pending,
    /// Accepted by the kitchen.
    Approved,
    /// Declined or withdrawn.
    Cancelled,
    /// Fulfilled.
    Completed,
}

impl OrderStatus {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Whether the kitchen may move an order from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Cancelled)
                | (Self::Approved, Self::Completed)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse error for [`OrderStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {value}")]
pub struct ParseOrderStatusError {
    /// The unrecognised value.
    pub value: String,
}

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(ParseOrderStatusError {
                value: other.to_owned(),
            }),
        }
    }
}

/// One line item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Menu item name.
    pub name: String,
    /// Number of units ordered.
    pub quantity: u32,
    /// Per-unit price in minor units, when the website itemises prices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price_minor: Option<i64>,
    /// Free-form customisations ("no onions", "extra cheese").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customizations: Vec<String>,
}

/// Customer contact and delivery details attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer name.
    pub name: String,
    /// Contact phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Contact email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Delivery address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Validated relay input: an order as the website submitted it, before
/// mapping resolution has assigned the kitchen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    /// The website's identifier for the restaurant.
    pub website_restaurant_id: WebsiteRestaurantId,
    /// Restaurant uid asserted by the caller, to be verified against the
    /// active mapping. A bare uid is never trusted on its own.
    pub asserted_restaurant_uid: Option<RestaurantUid>,
    /// Website-side order number.
    pub order_number: String,
    /// Order total.
    pub money: Money,
    /// Line items.
    pub items: Vec<OrderItem>,
    /// Customer details.
    pub customer: Customer,
    /// Optional callback endpoint for this specific order.
    pub callback_url: Option<CallbackUrl>,
    /// Caller-supplied replay token.
    pub idempotency_key: IdempotencyKey,
    /// Fingerprint of the submitted payload, for replay-vs-conflict
    /// decisions on key reuse.
    pub payload_hash: PayloadHash,
}

/// An order persisted for kitchen consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Row identifier.
    pub id: Uuid,
    /// Website-side order number.
    pub order_number: String,
    /// Order total.
    pub money: Money,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Line items.
    pub items: Vec<OrderItem>,
    /// Customer details.
    pub customer: Customer,
    /// Resolved kitchen identifier; the field the kitchen app filters on.
    pub restaurant_uid: RestaurantUid,
    /// Originating website identifier, retained for audit.
    pub website_restaurant_id: WebsiteRestaurantId,
    /// Optional per-order callback endpoint.
    pub callback_url: Option<CallbackUrl>,
    /// Caller-supplied replay token.
    pub idempotency_key: IdempotencyKey,
    /// Fingerprint of the originally submitted payload.
    pub payload_hash: PayloadHash,
    /// Receipt timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Materialise a pending order from a draft once the mapping resolved
    /// `restaurant_uid`.
    #[must_use]
    pub fn from_draft(draft: OrderDraft, restaurant_uid: RestaurantUid, now: DateTime<Utc>) -> Self {
        let OrderDraft {
            website_restaurant_id,
            asserted_restaurant_uid: _,
            order_number,
            money,
            items,
            customer,
            callback_url,
            idempotency_key,
            payload_hash,
        } = draft;
        Self {
            id: Uuid::new_v4(),
            order_number,
            money,
            status: OrderStatus::Pending,
            items,
            customer,
            restaurant_uid,
            website_restaurant_id,
            callback_url,
            idempotency_key,
            payload_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

//! Validated callback URL supplied by the ordering website.
//!
//! Every party in the relay identifies itself with an absolute http(s) URL.
//! The host component doubles as the default `website_domain` recorded on
//! handshake requests, so the wrapper exposes it directly.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Validation errors for [`CallbackUrl`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackUrlValidationError {
    /// The value could not be parsed as a URL at all.
    #[error("callback URL is not a valid absolute URL")]
    Unparseable,
    /// The URL parsed but uses a scheme other than http or https.
    #[error("callback URL must use http or https, got {scheme}")]
    UnsupportedScheme {
        /// The offending scheme.
        scheme: String,
    },
    /// The URL has no host component to derive a website domain from.
    #[error("callback URL must include a host")]
    MissingHost,
}

/// Absolute http(s) URL a website registers for callbacks.
///
/// # Examples
/// ```
/// use relay_backend::domain::CallbackUrl;
///
/// let url = CallbackUrl::parse("https://pizza.example/orders/hook").expect("valid URL");
/// assert_eq!(url.host(), "pizza.example");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CallbackUrl(Url);

impl CallbackUrl {
    /// Parse and validate a callback URL.
    ///
    /// # Errors
    ///
    /// Rejects relative URLs, non-http(s) schemes, and URLs without a host.
    pub fn parse(raw: &str) -> Result<Self, CallbackUrlValidationError> {
        let url = Url::parse(raw).map_err(|_| CallbackUrlValidationError::Unparseable)?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CallbackUrlValidationError::UnsupportedScheme {
                    scheme: other.to_owned(),
                });
            }
        }
        if url.host_str().is_none() {
            return Err(CallbackUrlValidationError::MissingHost);
        }
        Ok(Self(url))
    }

    /// The URL host, used as the default website domain.
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// The full URL as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CallbackUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CallbackUrl> for String {
    fn from(value: CallbackUrl) -> Self {
        value.0.into()
    }
}

impl TryFrom<String> for CallbackUrl {
    type Error = CallbackUrlValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

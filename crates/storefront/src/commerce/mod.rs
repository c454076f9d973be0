//! Remote commerce REST API client.
//!
//! # Architecture
//!
//! - The commerce API is the source of truth for carts, orders, addresses
//!   and the catalog. There is NO local sync and NO local database.
//! - One shared `reqwest::Client`; every call accepts an optional customer
//!   bearer token.
//! - Non-2xx responses and 2xx bodies carrying an `error`/`errors` envelope
//!   become [`CommerceError`] values carrying the server's message.
//! - Failures are never retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use mercado_storefront::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config.commerce)?;
//!
//! let cart = client.create_cart(None).await?;
//! let line = client.find_cart_item(None, &cart.id, &item_id).await?;
//! ```

mod account;
mod carts;
mod catalog;
mod client;
mod orders;
pub mod types;

pub use client::CommerceClient;
pub use types::*;

use thiserror::Error;

/// Maximum number of characters of a raw error body kept in a message.
const RAW_BODY_LIMIT: usize = 200;

/// Errors that can occur when talking to the commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The API could not be reached (connection refused, DNS, timeout).
    #[error("Commerce API unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// Any other HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The API answered 2xx but the body carried an error envelope.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for CommerceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unreachable(err)
        } else {
            Self::Http(err)
        }
    }
}

impl CommerceError {
    /// Message that can be shown to a shopper.
    ///
    /// Business messages from the API are passed through; transport and
    /// parsing details are not.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { status, message } if *status < 500 => message.clone(),
            Self::Rejected(message) => message.clone(),
            Self::RateLimited(_) => "Too many requests, please try again shortly".to_string(),
            _ => "The store is temporarily unavailable".to_string(),
        }
    }

    /// Whether the failure is the backend being unreachable.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// Extract the message from an `{error: {message}}` or `{errors: [{message}]}`
/// envelope.
pub(crate) fn envelope_error(body: &serde_json::Value) -> Option<String> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| error.to_string(), str::to_string);
        let code = error.get("code").and_then(serde_json::Value::as_str);
        return Some(match code {
            Some(code) => format!("{message} ({code})"),
            None => message,
        });
    }

    let errors = body.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| {
                e.get("message")
                    .and_then(serde_json::Value::as_str)
                    .map_or_else(|| e.to_string(), str::to_string)
            })
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Best-effort message for a non-success response body.
pub(crate) fn api_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = envelope_error(&value) {
            return message;
        }
        if let Some(detail) = value.get("detail").and_then(serde_json::Value::as_str) {
            return detail.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "(no error details provided)".to_string()
    } else {
        trimmed.chars().take(RAW_BODY_LIMIT).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_envelope_single_error() {
        let body = json!({"error": {"message": "Out of stock"}});
        assert_eq!(envelope_error(&body), Some("Out of stock".to_string()));
    }

    #[test]
    fn test_envelope_single_error_with_code() {
        let body = json!({"error": {"message": "Out of stock", "code": "stock"}});
        assert_eq!(
            envelope_error(&body),
            Some("Out of stock (stock)".to_string())
        );
    }

    #[test]
    fn test_envelope_error_list() {
        let body = json!({"errors": [{"message": "Bad quantity"}, {"message": "Bad item"}]});
        assert_eq!(
            envelope_error(&body),
            Some("Bad quantity; Bad item".to_string())
        );
    }

    #[test]
    fn test_envelope_absent_or_empty() {
        assert_eq!(envelope_error(&json!({"id": "c1"})), None);
        assert_eq!(envelope_error(&json!({"errors": []})), None);
        assert_eq!(envelope_error(&json!({"error": null, "id": "c1"})), None);
    }

    #[test]
    fn test_api_error_message_fallbacks() {
        assert_eq!(api_error_message(r#"{"detail": "Not found."}"#), "Not found.");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(api_error_message("   "), "(no error details provided)");
        assert_eq!(api_error_message(&"x".repeat(500)).len(), RAW_BODY_LIMIT);
    }

    #[test]
    fn test_user_message_masks_server_errors() {
        let err = CommerceError::Api {
            status: 400,
            message: "Quantity exceeds stock".to_string(),
        };
        assert_eq!(err.user_message(), "Quantity exceeds stock");

        let err = CommerceError::Api {
            status: 503,
            message: "upstream db down".to_string(),
        };
        assert_eq!(err.user_message(), "The store is temporarily unavailable");
    }

    #[test]
    fn test_rate_limited_display() {
        let err = CommerceError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
    }
}

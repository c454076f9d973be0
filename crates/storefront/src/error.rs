//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client with a JSON `{ "error": message }`
//! body. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::commerce::CommerceError;
use crate::services::cart::CartError;
use crate::services::postal::PostalError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart orchestration failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Commerce API operation failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Postal-code lookup failed.
    #[error("Postal error: {0}")]
    Postal(#[from] PostalError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An optional collaborator is not configured.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Status code for a commerce API failure.
const fn commerce_status(err: &CommerceError) -> StatusCode {
    match err {
        CommerceError::Api { status: 401, .. } => StatusCode::UNAUTHORIZED,
        CommerceError::Api { status: 404, .. } => StatusCode::NOT_FOUND,
        CommerceError::Api { status, .. } if *status < 500 => StatusCode::UNPROCESSABLE_ENTITY,
        CommerceError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CommerceError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        CommerceError::Api { .. } | CommerceError::Unreachable(_) | CommerceError::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        CommerceError::Parse(_) | CommerceError::InvalidUrl(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Cart(err) => match err {
                CartError::NoCartId => StatusCode::CONFLICT,
                CartError::PriceOverflow => StatusCode::UNPROCESSABLE_ENTITY,
                CartError::InvalidQuantity(_) | CartError::DeliveryUnavailable => {
                    StatusCode::BAD_REQUEST
                }
                CartError::Commerce(err) => commerce_status(err),
                CartError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Commerce(err) => commerce_status(err),
            Self::Postal(err) => match err {
                PostalError::InvalidCode(_) => StatusCode::BAD_REQUEST,
                PostalError::NotFound(_) => StatusCode::NOT_FOUND,
                PostalError::Http(_) | PostalError::Api { .. } | PostalError::Parse(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Cart(CartError::Commerce(err)) | Self::Commerce(err) => err.user_message(),
            Self::Cart(CartError::Session(_)) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Cart(err) => err.to_string(),
            Self::Postal(err) => match err {
                PostalError::InvalidCode(e) => format!("Invalid postal code: {e}"),
                PostalError::NotFound(code) => format!("Unknown postal code {code}"),
                _ => "Postal code lookup is temporarily unavailable".to_string(),
            },
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::ServiceUnavailable(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = Json(json!({ "error": self.user_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("item", "P1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

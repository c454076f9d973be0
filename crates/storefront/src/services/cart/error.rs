//! Cart orchestration error types.

use thiserror::Error;

use crate::commerce::CommerceError;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The operation needs an existing cart and the session has none.
    #[error("no cart ID in session; add an item to start a cart")]
    NoCartId,

    /// Quantity is zero where a positive amount is required, or overflows.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// A cart or line total does not fit in a price.
    #[error("cart total exceeds the largest supported amount")]
    PriceOverflow,

    /// Delivery was requested but no delivery item is configured.
    #[error("delivery is not available")]
    DeliveryUnavailable,

    /// Remote commerce API failure.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// Session storage failure.
    #[error("session error: {0}")]
    Session(String),
}

impl From<tower_sessions::session::Error> for CartError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Session(err.to_string())
    }
}

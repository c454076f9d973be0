//! Session-stored state.
//!
//! The session holds only opaque references owned by the commerce API.

/// Session keys.
pub mod keys {
    /// Key for the current cart identifier.
    pub const CART_ID: &str = "cart_id";

    /// Key for the customer's commerce API token.
    pub const AUTH_TOKEN: &str = "auth_token";
}

//! Business logic services for the storefront.
//!
//! - `cart` - Cart orchestration (add-to-cart strategies, fulfillment toggle,
//!   cart identity lifecycle)
//! - `postal` - Postal-code lookup for address auto-fill

pub mod cart;
pub mod postal;

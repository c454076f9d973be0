//! Storefront-local models.
//!
//! Everything durable lives in the commerce API; the only local state is
//! what the session carries between requests.

pub mod session;

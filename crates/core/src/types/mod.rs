//! Core types for Mercado.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod postal;
pub mod price;
pub mod status;

pub use credential::AuthToken;
pub use email::{Email, EmailError};
pub use id::*;
pub use postal::{PostalCode, PostalCodeError};
pub use price::{Price, PriceError};
pub use status::*;

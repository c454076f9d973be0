//! Mercado Core - Shared domain types.
//!
//! This crate provides the types shared by every Mercado component:
//! - `storefront` - Public storefront over the remote commerce API
//! - `cli` - Operator tooling for carts and postal lookups
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. All
//! entities are owned by the remote commerce API; these are the local,
//! strongly-typed references to them.
//!
//! # Modules
//!
//! - [`types`] - Opaque string IDs, prices, product kinds, fulfillment modes,
//!   emails, postal codes and auth tokens

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

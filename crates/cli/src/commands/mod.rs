//! CLI command implementations.

pub mod cart;
pub mod postal;

use mercado_storefront::commerce::CommerceError;
use mercado_storefront::config::ConfigError;
use mercado_storefront::services::cart::CartError;
use mercado_storefront::services::postal::PostalError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Commerce API call failed.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// Cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Postal lookup failed.
    #[error(transparent)]
    Postal(#[from] PostalError),

    /// A command-line argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The cart named on the command line does not exist.
    #[error("Cart not found: {0}")]
    CartNotFound(String),

    /// Output could not be encoded.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Print a value as pretty JSON on stdout.
#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Postal-code lookup command.

use std::time::Duration;

use mercado_storefront::services::postal::PostalClient;
use url::Url;

use super::{CliError, print_json};

/// Resolve a postal code and print the candidates.
///
/// # Errors
///
/// Returns an error if the code is malformed, unknown, or the lookup fails.
pub async fn lookup(api_url: Url, code: &str) -> Result<(), CliError> {
    let client = PostalClient::new(api_url, Duration::from_secs(10))?;
    let lookup = client.lookup(code).await?;
    tracing::info!(
        code = %lookup.code,
        cities = lookup.cities.len(),
        suburbs = lookup.suburbs.len(),
        "Postal code resolved"
    );
    print_json(&lookup)
}

//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COMMERCE_API_URL` - Base URL of the commerce REST API
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `COMMERCE_API_TOKEN` - Service token sent when no customer is logged in
//! - `COMMERCE_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `COMMERCE_DEGRADE_ON_UNREACHABLE` - Serve empty reads when the API is down (default: false)
//! - `DELIVERY_ITEM_ID` / `DELIVERY_ITEM_PRICE` - Delivery charge line item (set both or neither)
//! - `POSTAL_API_URL` - Postal-code lookup service
//! - `VIEW_CACHE_TTL_SECS` - Lifetime of cached views (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use mercado_core::{ItemId, Price};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::commerce::DeliveryItem;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Commerce REST API configuration
    pub commerce: CommerceConfig,
    /// Delivery charge line item, if delivery is offered
    pub delivery_item: Option<DeliveryItem>,
    /// Postal-code lookup service base URL
    pub postal_api_url: Option<Url>,
    /// Lifetime of cached views
    pub view_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Commerce REST API configuration.
///
/// Implements `Debug` manually to redact the service token.
#[derive(Clone)]
pub struct CommerceConfig {
    /// API base URL (always ends with `/`)
    pub base_url: Url,
    /// Service token used when no customer token is present
    pub api_token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Answer empty reads instead of failing when the API is unreachable
    pub degrade_on_unreachable: bool,
}

impl std::fmt::Debug for CommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("degrade_on_unreachable", &self.degrade_on_unreachable)
            .finish()
    }
}

impl CommerceConfig {
    /// Configuration for a given base URL with defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("COMMERCE_API_URL", base_url)?,
            api_token: None,
            timeout: Duration::from_secs(30),
            degrade_on_unreachable: false,
        })
    }

    /// Load only the commerce settings from environment variables.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`], restricted to the
    /// `COMMERCE_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&Env(&|key: &str| std::env::var(key).ok()))
    }

    fn from_lookup(env: &Env<'_>) -> Result<Self, ConfigError> {
        let raw_url = env.required("COMMERCE_API_URL")?;
        let api_token = env
            .optional("COMMERCE_API_TOKEN")
            .map(|token| {
                validate_secret_strength(&token, "COMMERCE_API_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(token))
            })
            .transpose()?;

        Ok(Self {
            base_url: parse_base_url("COMMERCE_API_URL", &raw_url)?,
            api_token,
            timeout: Duration::from_secs(env.parsed_or("COMMERCE_TIMEOUT_SECS", 30)?),
            degrade_on_unreachable: env.flag("COMMERCE_DEGRADE_ON_UNREACHABLE")?,
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let host = env
            .optional("STOREFRONT_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_string())
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = env.parsed_or("STOREFRONT_PORT", 3000_u16)?;
        let base_url = env.required("STOREFRONT_BASE_URL")?;

        let commerce = CommerceConfig::from_lookup(&env)?;
        let delivery_item = delivery_item_from_lookup(&env)?;
        let postal_api_url = env
            .optional("POSTAL_API_URL")
            .map(|raw| parse_base_url("POSTAL_API_URL", &raw))
            .transpose()?;
        let view_cache_ttl = Duration::from_secs(env.parsed_or("VIEW_CACHE_TTL_SECS", 300)?);

        Ok(Self {
            host,
            port,
            base_url,
            commerce,
            delivery_item,
            postal_api_url,
            view_cache_ttl,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Borrowed environment lookup with typed accessors.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        match self.optional(key).as_deref().map(str::trim) {
            None => Ok(false),
            Some("1" | "true" | "TRUE" | "yes") => Ok(true),
            Some("0" | "false" | "FALSE" | "no") => Ok(false),
            Some(other) => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }
}

/// Parse a base URL and make sure relative joins append to its path.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Read the delivery charge item; both variables must be set together.
/// Default delivery charge item from `DELIVERY_ITEM_ID` and
/// `DELIVERY_ITEM_PRICE`.
///
/// # Errors
///
/// Returns an error if only one of the two is set or the price is invalid.
pub fn delivery_item_from_env() -> Result<Option<DeliveryItem>, ConfigError> {
    let _ = dotenvy::dotenv();
    delivery_item_from_lookup(&Env(&|key: &str| std::env::var(key).ok()))
}

fn delivery_item_from_lookup(env: &Env<'_>) -> Result<Option<DeliveryItem>, ConfigError> {
    match (env.optional("DELIVERY_ITEM_ID"), env.optional("DELIVERY_ITEM_PRICE")) {
        (None, None) => Ok(None),
        (Some(id), Some(raw_price)) => {
            let price = raw_price.parse::<Price>().map_err(|e| {
                ConfigError::InvalidEnvVar("DELIVERY_ITEM_PRICE".to_string(), e.to_string())
            })?;
            Ok(Some(DeliveryItem {
                id: ItemId::new(id),
                price,
            }))
        }
        (Some(_), None) => Err(ConfigError::MissingEnvVar("DELIVERY_ITEM_PRICE".to_string())),
        (None, Some(_)) => Err(ConfigError::MissingEnvVar("DELIVERY_ITEM_ID".to_string())),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    // Real API tokens are random; low entropy means a hand-typed value
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by the commerce API."
            ),
        ));
    }

    Ok(())
}

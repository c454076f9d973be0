//! Postal-code lookup client for address auto-fill.
//!
//! Resolves a 5-digit postal code to the candidate states, cities and
//! suburbs it covers. Postal data is effectively static, so answers are
//! cached for an hour.

use std::collections::BTreeSet;
use std::time::Duration;

use mercado_core::{PostalCode, PostalCodeError};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Cache lifetime for lookups.
const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Maximum cached postal codes.
const CACHE_CAPACITY: u64 = 5_000;

/// Errors that can occur when looking up a postal code.
#[derive(Debug, Error)]
pub enum PostalError {
    /// The code is not 5 ASCII digits.
    #[error("invalid postal code: {0}")]
    InvalidCode(#[from] PostalCodeError),

    /// The service knows nothing about the code.
    #[error("postal code not found: {0}")]
    NotFound(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Candidate values for the address fields a postal code covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostalLookup {
    pub code: PostalCode,
    pub states: Vec<String>,
    pub cities: Vec<String>,
    pub suburbs: Vec<String>,
}

/// One settlement entry as returned by the lookup service.
#[derive(Debug, Deserialize)]
struct Settlement {
    #[serde(default)]
    state: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    suburb: String,
}

/// The service answers either a bare list or a `{results: [...]}` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LookupResponse {
    List(Vec<Settlement>),
    Envelope { results: Vec<Settlement> },
}

impl LookupResponse {
    fn into_settlements(self) -> Vec<Settlement> {
        match self {
            Self::List(settlements) | Self::Envelope { results: settlements } => settlements,
        }
    }
}

/// Postal-code lookup client.
#[derive(Clone)]
pub struct PostalClient {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<PostalCode, PostalLookup>,
}

impl PostalClient {
    /// Create a new lookup client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, PostalError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        })
    }

    /// Resolve a postal code.
    ///
    /// The code is validated before any request is made.
    ///
    /// # Errors
    ///
    /// Returns `PostalError::InvalidCode` for malformed input,
    /// `PostalError::NotFound` when the service has no entries, or a
    /// transport/API error.
    #[instrument(skip(self))]
    pub async fn lookup(&self, raw: &str) -> Result<PostalLookup, PostalError> {
        let code = PostalCode::parse(raw)?;

        if let Some(cached) = self.cache.get(&code).await {
            debug!("Postal lookup cache hit");
            return Ok(cached);
        }

        let url = self
            .base_url
            .join(&urlencoding::encode(code.as_str()))
            .map_err(|e| PostalError::Parse(format!("Invalid lookup URL: {e}")))?;
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PostalError::NotFound(code.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PostalError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| PostalError::Parse(e.to_string()))?;
        let lookup = collect(code.clone(), body.into_settlements())
            .ok_or_else(|| PostalError::NotFound(code.to_string()))?;

        self.cache.insert(code, lookup.clone()).await;
        Ok(lookup)
    }
}

/// Deduplicate and sort each field; `None` when nothing usable came back.
fn collect(code: PostalCode, settlements: Vec<Settlement>) -> Option<PostalLookup> {
    let mut states = BTreeSet::new();
    let mut cities = BTreeSet::new();
    let mut suburbs = BTreeSet::new();

    for settlement in settlements {
        for (set, value) in [
            (&mut states, settlement.state),
            (&mut cities, settlement.city),
            (&mut suburbs, settlement.suburb),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                set.insert(value.to_string());
            }
        }
    }

    if states.is_empty() && cities.is_empty() && suburbs.is_empty() {
        return None;
    }

    Some(PostalLookup {
        code,
        states: states.into_iter().collect(),
        cities: cities.into_iter().collect(),
        suburbs: suburbs.into_iter().collect(),
    })
}

//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::ViewCache;
use crate::commerce::{CommerceClient, CommerceError};
use crate::config::StorefrontConfig;
use crate::services::cart::CartService;
use crate::services::postal::{PostalClient, PostalError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("commerce client: {0}")]
    Commerce(#[from] CommerceError),
    #[error("postal client: {0}")]
    Postal(#[from] PostalError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the commerce API client, the cart service and the view cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
    cart: CartService<CommerceClient>,
    postal: Option<PostalClient>,
    views: ViewCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let commerce = CommerceClient::new(&config.commerce)?;
        let views = ViewCache::new(config.view_cache_ttl);
        let cart = CartService::new(commerce.clone(), views.clone(), config.delivery_item.clone());
        let postal = config
            .postal_api_url
            .clone()
            .map(|url| PostalClient::new(url, config.commerce.timeout))
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                cart,
                postal,
                views,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService<CommerceClient> {
        &self.inner.cart
    }

    /// The postal-code lookup client, when configured.
    #[must_use]
    pub fn postal(&self) -> Option<&PostalClient> {
        self.inner.postal.as_ref()
    }

    /// Get a reference to the view cache.
    #[must_use]
    pub fn views(&self) -> &ViewCache {
        &self.inner.views
    }
}

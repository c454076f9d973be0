//! Cart identity lifecycle.
//!
//! A browsing session owns at most one cart identifier. Operations receive
//! it through an explicit [`SessionContext`]; persistence goes through a
//! [`CartIdStore`].
//!
//! Two concurrent requests from the same session that both find no cart
//! will both create one; the last to save its identifier wins and the other
//! cart is abandoned remotely.

use std::future::Future;

use mercado_core::{AuthToken, CartId};
use tokio::sync::Mutex;
use tower_sessions::Session;
use tracing::{info, instrument};

use super::{CartBackend, CartError};
use crate::models::session::keys;

/// Per-request view of the session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Current cart identifier, if one has been created.
    pub cart_id: Option<CartId>,
    /// Customer token, when logged in.
    pub auth_token: Option<AuthToken>,
    /// Stable per-session key for caching session-scoped views.
    pub view_key: Option<String>,
}

impl SessionContext {
    /// Context for a known cart and optional customer.
    #[must_use]
    pub const fn new(cart_id: Option<CartId>, auth_token: Option<AuthToken>) -> Self {
        Self {
            cart_id,
            auth_token,
            view_key: None,
        }
    }

    /// Customer token to forward to the commerce API.
    #[must_use]
    pub const fn token(&self) -> Option<&AuthToken> {
        self.auth_token.as_ref()
    }

    /// The current cart identifier, if any.
    #[must_use]
    pub const fn current_cart_id(&self) -> Option<&CartId> {
        self.cart_id.as_ref()
    }

    /// The current cart identifier, failing when there is none.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCartId` if the session has no cart.
    pub fn require_cart_id(&self) -> Result<&CartId, CartError> {
        self.cart_id.as_ref().ok_or(CartError::NoCartId)
    }
}

/// Durable storage for the session's cart identifier.
pub trait CartIdStore: Send + Sync {
    fn load_cart_id(&self) -> impl Future<Output = Result<Option<CartId>, CartError>> + Send;

    fn save_cart_id(&self, id: &CartId) -> impl Future<Output = Result<(), CartError>> + Send;

    fn clear_cart_id(&self) -> impl Future<Output = Result<(), CartError>> + Send;
}

impl CartIdStore for Session {
    async fn load_cart_id(&self) -> Result<Option<CartId>, CartError> {
        Ok(self.get::<CartId>(keys::CART_ID).await?)
    }

    async fn save_cart_id(&self, id: &CartId) -> Result<(), CartError> {
        Ok(self.insert(keys::CART_ID, id).await?)
    }

    async fn clear_cart_id(&self) -> Result<(), CartError> {
        self.remove::<CartId>(keys::CART_ID).await?;
        Ok(())
    }
}

/// Process-local store, used where there is no HTTP session.
#[derive(Debug, Default)]
pub struct MemoryCartIdStore {
    cart_id: Mutex<Option<CartId>>,
}

impl MemoryCartIdStore {
    /// Store pre-seeded with `cart_id`.
    #[must_use]
    pub fn with_cart_id(cart_id: Option<CartId>) -> Self {
        Self {
            cart_id: Mutex::new(cart_id),
        }
    }
}

impl CartIdStore for MemoryCartIdStore {
    async fn load_cart_id(&self) -> Result<Option<CartId>, CartError> {
        Ok(self.cart_id.lock().await.clone())
    }

    async fn save_cart_id(&self, id: &CartId) -> Result<(), CartError> {
        *self.cart_id.lock().await = Some(id.clone());
        Ok(())
    }

    async fn clear_cart_id(&self) -> Result<(), CartError> {
        *self.cart_id.lock().await = None;
        Ok(())
    }
}

/// Return the session's cart, creating and storing one if there is none.
///
/// # Errors
///
/// Returns an error if cart creation or saving the identifier fails.
#[instrument(skip_all)]
pub async fn ensure_cart<B, S>(
    backend: &B,
    store: &S,
    ctx: &mut SessionContext,
) -> Result<CartId, CartError>
where
    B: CartBackend,
    S: CartIdStore,
{
    if let Some(id) = &ctx.cart_id {
        return Ok(id.clone());
    }

    let cart = backend.create_cart(ctx.token()).await?;
    store.save_cart_id(&cart.id).await?;
    info!(cart_id = %cart.id, "Created cart");

    ctx.cart_id = Some(cart.id.clone());
    Ok(cart.id)
}

/// Forget the session's cart identifier.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn clear_cart_id<S: CartIdStore>(
    store: &S,
    ctx: &mut SessionContext,
) -> Result<(), CartError> {
    store.clear_cart_id().await?;
    ctx.cart_id = None;
    Ok(())
}

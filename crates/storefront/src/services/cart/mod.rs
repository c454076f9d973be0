//! Cart orchestration over the commerce API.
//!
//! [`CartService`] composes the add-to-cart strategies, the fulfillment
//! toggle and the cart identity lifecycle, and invalidates the `cart` and
//! `active-order` view tags after every successful mutation.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut ctx = SessionContext::new(session.load_cart_id().await?, token);
//! let request = AddItemRequest::standard(ProductKind::Simple, item_id, 2);
//! let line = state.cart.add_item(&mut ctx, &session, &request).await?;
//! ```

mod backend;
mod error;
mod fulfillment;
mod identity;
mod strategy;
#[cfg(test)]
mod testing;

pub use backend::CartBackend;
pub use error::CartError;
pub use fulfillment::{switch_to_delivery, switch_to_pickup};
pub use identity::{CartIdStore, MemoryCartIdStore, SessionContext, clear_cart_id, ensure_cart};
pub use strategy::{AddItemRequest, add_item_to_cart, compound_total};

use mercado_core::{AddressId, LineItemId};
use tracing::{info, instrument};

use crate::cache::{CART_MUTATION_TAGS, CachedView, ViewCache, ViewTag};
use crate::commerce::{CartUpdate, DeliveryItem, Order, PaymentRequest, ShopCart, ShopCartItem};

/// Cart operations for one storefront.
pub struct CartService<B> {
    backend: B,
    views: ViewCache,
    delivery_item: Option<DeliveryItem>,
}

impl<B: CartBackend> CartService<B> {
    /// Create a cart service.
    ///
    /// `delivery_item` is the default delivery charge used when a toggle
    /// request does not name one.
    #[must_use]
    pub const fn new(backend: B, views: ViewCache, delivery_item: Option<DeliveryItem>) -> Self {
        Self {
            backend,
            views,
            delivery_item,
        }
    }

    /// The underlying backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The configured delivery charge item, if any.
    #[must_use]
    pub const fn delivery_item(&self) -> Option<&DeliveryItem> {
        self.delivery_item.as_ref()
    }

    /// Current cart, served from the view cache when possible.
    ///
    /// Returns `None` when the session has no cart or the cart is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote read fails.
    #[instrument(skip_all)]
    pub async fn show(&self, ctx: &SessionContext) -> Result<Option<ShopCart>, CartError> {
        let Some(cart_id) = ctx.current_cart_id() else {
            return Ok(None);
        };

        let key = format!("cart:{cart_id}");
        if let Some(CachedView::Cart(cart)) = self.views.get(&key).await {
            return Ok(Some(*cart));
        }

        let snapshot = self.views.snapshot(&[ViewTag::Cart]);
        let cart = self.backend.get_cart(ctx.token(), cart_id).await?;
        if let Some(cart) = &cart {
            self.views
                .insert(
                    key,
                    CachedView::Cart(Box::new(cart.clone())),
                    &[ViewTag::Cart],
                    snapshot,
                )
                .await;
        }
        Ok(cart)
    }

    /// Add an item, creating the cart first if the session has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is invalid or a remote call fails.
    #[instrument(skip_all)]
    pub async fn add_item<S: CartIdStore>(
        &self,
        ctx: &mut SessionContext,
        store: &S,
        request: &AddItemRequest,
    ) -> Result<ShopCartItem, CartError> {
        request.validate()?;
        let cart_id = ensure_cart(&self.backend, store, ctx).await?;
        let line = add_item_to_cart(&self.backend, ctx.token(), &cart_id, request).await?;
        self.invalidate().await;
        Ok(line)
    }

    /// Set a line's quantity; zero removes the line and answers `None`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCartId` before any remote call if the session
    /// has no cart, otherwise any remote failure.
    #[instrument(skip_all, fields(line = %line, quantity))]
    pub async fn adjust_quantity(
        &self,
        ctx: &SessionContext,
        line: &LineItemId,
        quantity: u32,
    ) -> Result<Option<ShopCartItem>, CartError> {
        ctx.require_cart_id()?;

        let updated = if quantity == 0 {
            self.backend.remove_cart_item(ctx.token(), line).await?;
            None
        } else {
            Some(
                self.backend
                    .update_cart_item_quantity(ctx.token(), line, quantity)
                    .await?,
            )
        };
        self.invalidate().await;
        Ok(updated)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCartId` if the session has no cart, otherwise
    /// any remote failure.
    #[instrument(skip_all, fields(line = %line))]
    pub async fn remove_item(&self, ctx: &SessionContext, line: &LineItemId) -> Result<(), CartError> {
        ctx.require_cart_id()?;
        self.backend.remove_cart_item(ctx.token(), line).await?;
        self.invalidate().await;
        Ok(())
    }

    /// Switch to delivery using `delivery`, or the configured delivery item.
    ///
    /// # Errors
    ///
    /// Returns `CartError::DeliveryUnavailable` if no delivery item is known,
    /// otherwise the first remote failure.
    #[instrument(skip_all)]
    pub async fn switch_to_delivery<S: CartIdStore>(
        &self,
        ctx: &mut SessionContext,
        store: &S,
        delivery: Option<&DeliveryItem>,
    ) -> Result<ShopCart, CartError> {
        let delivery = delivery
            .or(self.delivery_item.as_ref())
            .ok_or(CartError::DeliveryUnavailable)?;
        let cart_id = ensure_cart(&self.backend, store, ctx).await?;
        let cart = switch_to_delivery(&self.backend, ctx.token(), &cart_id, delivery).await?;
        self.invalidate().await;
        Ok(cart)
    }

    /// Switch to pickup, removing the delivery line if one is known.
    ///
    /// # Errors
    ///
    /// Returns the first remote failure.
    #[instrument(skip_all)]
    pub async fn switch_to_pickup<S: CartIdStore>(
        &self,
        ctx: &mut SessionContext,
        store: &S,
        delivery: Option<&DeliveryItem>,
    ) -> Result<ShopCart, CartError> {
        let delivery = delivery.or(self.delivery_item.as_ref());
        let cart_id = ensure_cart(&self.backend, store, ctx).await?;
        let cart = switch_to_pickup(&self.backend, ctx.token(), &cart_id, delivery).await?;
        self.invalidate().await;
        Ok(cart)
    }

    /// Set the cart's shipment address.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCartId` if the session has no cart, otherwise
    /// any remote failure.
    #[instrument(skip_all, fields(address = %address))]
    pub async fn assign_address(
        &self,
        ctx: &SessionContext,
        address: &AddressId,
    ) -> Result<ShopCart, CartError> {
        let cart_id = ctx.require_cart_id()?;
        let cart = self
            .backend
            .update_cart(ctx.token(), cart_id, &CartUpdate::address(address.clone()))
            .await?;
        self.invalidate().await;
        Ok(cart)
    }

    /// Pay for the cart and forget its identifier.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCartId` if the session has no cart, otherwise
    /// the payment failure. The cart identifier is kept when payment fails.
    #[instrument(skip_all)]
    pub async fn checkout<S: CartIdStore>(
        &self,
        ctx: &mut SessionContext,
        store: &S,
        payment: &PaymentRequest,
    ) -> Result<Order, CartError> {
        let cart_id = ctx.require_cart_id()?.clone();
        let order = self.backend.pay_cart(ctx.token(), &cart_id, payment).await?;
        info!(cart_id = %cart_id, order_id = %order.id, "Cart converted to order");

        clear_cart_id(store, ctx).await?;
        self.invalidate().await;
        Ok(order)
    }

    /// Start over: forget the session's cart identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn clear<S: CartIdStore>(
        &self,
        ctx: &mut SessionContext,
        store: &S,
    ) -> Result<(), CartError> {
        clear_cart_id(store, ctx).await?;
        self.invalidate().await;
        Ok(())
    }

    async fn invalidate(&self) {
        self.views.invalidate_tags(&CART_MUTATION_TAGS).await;
    }
}

//! Delivery/pickup toggle.
//!
//! Each switch is a short sequence of remote calls with no transaction
//! around it. A failure stops the sequence and propagates, possibly leaving
//! the cart half-switched; callers should refetch the cart after an error.

use mercado_core::{AuthToken, CartId};
use tracing::{instrument, warn};

use super::{CartBackend, CartError};
use crate::commerce::{CartUpdate, DeliveryItem, NewCartItem, ShopCart};

/// Switch a cart to delivery, adding the delivery charge line at most once.
///
/// # Errors
///
/// Returns the first remote failure.
#[instrument(skip(backend, token, delivery), fields(cart_id = %cart_id, delivery_item = %delivery.id))]
pub async fn switch_to_delivery<B: CartBackend>(
    backend: &B,
    token: Option<&AuthToken>,
    cart_id: &CartId,
    delivery: &DeliveryItem,
) -> Result<ShopCart, CartError> {
    let existing = backend.find_cart_item(token, cart_id, &delivery.id).await?;

    let added = if existing.is_none() {
        let line = NewCartItem {
            cart: cart_id.clone(),
            item: delivery.id.clone(),
            quantity: 1,
            price: Some(delivery.price),
            materials: Vec::new(),
        };
        backend.create_cart_item(token, &line).await?;
        true
    } else {
        false
    };

    backend
        .update_cart(token, cart_id, &CartUpdate::delivery())
        .await
        .inspect_err(|e| {
            if added {
                warn!(error = %e, "Delivery line added but cart flags not updated");
            }
        })
        .map_err(CartError::from)
}

/// Switch a cart to pickup, dropping any delivery charge line and address.
///
/// # Errors
///
/// Returns the first remote failure.
#[instrument(skip(backend, token, delivery), fields(cart_id = %cart_id))]
pub async fn switch_to_pickup<B: CartBackend>(
    backend: &B,
    token: Option<&AuthToken>,
    cart_id: &CartId,
    delivery: Option<&DeliveryItem>,
) -> Result<ShopCart, CartError> {
    let mut removed = false;
    if let Some(delivery) = delivery
        && let Some(line) = backend.find_cart_item(token, cart_id, &delivery.id).await?
    {
        backend.remove_cart_item(token, &line.id).await?;
        removed = true;
    }

    backend
        .update_cart(token, cart_id, &CartUpdate::pickup())
        .await
        .inspect_err(|e| {
            if removed {
                warn!(error = %e, "Delivery line removed but cart flags not updated");
            }
        })
        .map_err(CartError::from)
}

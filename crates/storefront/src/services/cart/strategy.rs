//! Add-to-cart strategy selection.
//!
//! Simple and group items merge into an existing line for the same item.
//! Compound items always get a new line, because their materials are not
//! part of the item identifier the existence check uses.

use mercado_core::{AuthToken, CartId, ItemId, Price, ProductKind};
use tracing::{debug, instrument, warn};

use super::{CartBackend, CartError};
use crate::commerce::{Material, NewCartItem, ShopCartItem};

/// What to add to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddItemRequest {
    /// Simple item, resolved group variant, or an unrecognized kind.
    Standard {
        item: ItemId,
        quantity: u32,
        kind: ProductKind,
    },
    /// Base item plus selected extra materials at a precomputed unit price.
    Compound {
        item: ItemId,
        quantity: u32,
        materials: Vec<ItemId>,
        total_price: Price,
    },
}

impl AddItemRequest {
    /// Request for a simple or group item.
    #[must_use]
    pub fn standard(kind: ProductKind, item: ItemId, quantity: u32) -> Self {
        Self::Standard {
            item,
            quantity,
            kind,
        }
    }

    /// Request for a compound item.
    #[must_use]
    pub const fn compound(
        item: ItemId,
        quantity: u32,
        materials: Vec<ItemId>,
        total_price: Price,
    ) -> Self {
        Self::Compound {
            item,
            quantity,
            materials,
            total_price,
        }
    }

    #[must_use]
    pub const fn item(&self) -> &ItemId {
        match self {
            Self::Standard { item, .. } | Self::Compound { item, .. } => item,
        }
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        match self {
            Self::Standard { quantity, .. } | Self::Compound { quantity, .. } => *quantity,
        }
    }

    /// Reject zero quantities before anything touches the network.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` when the quantity is zero.
    pub fn validate(&self) -> Result<(), CartError> {
        if self.quantity() == 0 {
            return Err(CartError::InvalidQuantity(
                "quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Unit price of a compound item: its base price plus every selected material.
///
/// # Errors
///
/// Returns `CartError::PriceOverflow` if the sum does not fit in a price.
pub fn compound_total(base: Price, materials: &[Material]) -> Result<Price, CartError> {
    Price::checked_sum(materials.iter().map(|material| material.price))
        .and_then(|extras| base.checked_add(extras))
        .ok_or(CartError::PriceOverflow)
}

/// Add an item to a cart using the strategy for its kind.
///
/// # Errors
///
/// Returns an error if the quantity is invalid or a remote call fails.
#[instrument(skip(backend, token, request), fields(cart_id = %cart_id, item = %request.item()))]
pub async fn add_item_to_cart<B: CartBackend>(
    backend: &B,
    token: Option<&AuthToken>,
    cart_id: &CartId,
    request: &AddItemRequest,
) -> Result<ShopCartItem, CartError> {
    request.validate()?;

    match request {
        AddItemRequest::Standard {
            item,
            quantity,
            kind,
        } => {
            if let ProductKind::Unknown(raw) = kind {
                warn!(kind = %raw, "Unrecognized product kind, adding as a simple item");
            }
            if !kind.merges_duplicates() {
                debug!(kind = %kind, "Kind never merges, creating a new line");
                let line = NewCartItem {
                    cart: cart_id.clone(),
                    item: item.clone(),
                    quantity: *quantity,
                    price: None,
                    materials: Vec::new(),
                };
                return Ok(backend.create_cart_item(token, &line).await?);
            }
            merge_or_create(backend, token, cart_id, item, *quantity).await
        }
        AddItemRequest::Compound {
            item,
            quantity,
            materials,
            total_price,
        } => {
            let line = NewCartItem {
                cart: cart_id.clone(),
                item: item.clone(),
                quantity: *quantity,
                price: Some(*total_price),
                materials: materials.clone(),
            };
            Ok(backend.create_cart_item(token, &line).await?)
        }
    }
}

async fn merge_or_create<B: CartBackend>(
    backend: &B,
    token: Option<&AuthToken>,
    cart_id: &CartId,
    item: &ItemId,
    quantity: u32,
) -> Result<ShopCartItem, CartError> {
    if let Some(existing) = backend.find_cart_item(token, cart_id, item).await? {
        let merged = existing.quantity.checked_add(quantity).ok_or_else(|| {
            CartError::InvalidQuantity(format!(
                "{} + {quantity} exceeds the maximum quantity",
                existing.quantity
            ))
        })?;
        debug!(line = %existing.id, from = existing.quantity, to = merged, "Merging into existing line");
        return Ok(backend
            .update_cart_item_quantity(token, &existing.id, merged)
            .await?);
    }

    let line = NewCartItem {
        cart: cart_id.clone(),
        item: item.clone(),
        quantity,
        price: None,
        materials: Vec::new(),
    };
    Ok(backend.create_cart_item(token, &line).await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mercado_core::LineItemId;

    use super::super::testing::{Call, RecordingBackend};
    use super::*;

    fn cart() -> CartId {
        CartId::new("c1")
    }

    fn price(raw: &str) -> Price {
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn test_existing_simple_item_is_merged() {
        let backend = RecordingBackend::with_cart("c1");
        backend.seed_line("c1", "l-p1", "P1", 2, "10.00");

        let request = AddItemRequest::standard(ProductKind::Simple, ItemId::new("P1"), 1);
        let line = add_item_to_cart(&backend, None, &cart(), &request)
            .await
            .unwrap();

        assert_eq!(line.quantity, 3);
        assert_eq!(
            backend.calls(),
            vec![
                Call::FindCartItem(cart(), ItemId::new("P1")),
                Call::UpdateQuantity(LineItemId::new("l-p1"), 3),
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_adds_accumulate_on_one_line() {
        let backend = RecordingBackend::with_cart("c1");

        for quantity in [2, 5] {
            let request = AddItemRequest::standard(ProductKind::Group, ItemId::new("V-red"), quantity);
            add_item_to_cart(&backend, None, &cart(), &request)
                .await
                .unwrap();
        }

        let cart = backend.cart("c1");
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_quantity(), 7);
    }

    #[tokio::test]
    async fn test_compound_items_never_merge() {
        let backend = RecordingBackend::with_cart("c1");

        let first = AddItemRequest::compound(
            ItemId::new("B1"),
            1,
            vec![ItemId::new("M-cheese")],
            price("12.00"),
        );
        let second = AddItemRequest::compound(
            ItemId::new("B1"),
            1,
            vec![ItemId::new("M-avocado")],
            price("14.00"),
        );
        add_item_to_cart(&backend, None, &cart(), &first).await.unwrap();
        add_item_to_cart(&backend, None, &cart(), &second).await.unwrap();

        let cart = backend.cart("c1");
        assert_eq!(cart.items.len(), 2);
        assert!(
            backend
                .calls()
                .iter()
                .all(|call| matches!(call, Call::CreateCartItem(_)))
        );
        assert_eq!(cart.subtotal(), Some(price("26.00")));
    }

    #[tokio::test]
    async fn test_standard_compound_request_creates_new_line() {
        let backend = RecordingBackend::with_cart("c1");
        backend.seed_line("c1", "l-b1", "B1", 1, "12.00");

        let request = AddItemRequest::standard(ProductKind::Compound, ItemId::new("B1"), 1);
        add_item_to_cart(&backend, None, &cart(), &request)
            .await
            .unwrap();

        assert_eq!(backend.cart("c1").items.len(), 2);
        assert!(matches!(
            backend.calls().as_slice(),
            [Call::CreateCartItem(line)] if line.item.as_str() == "B1" && line.quantity == 1
        ));
    }

    #[tokio::test]
    async fn test_unknown_kind_takes_simple_path() {
        let backend = RecordingBackend::with_cart("c1");
        backend.seed_line("c1", "l-x", "X1", 1, "3.00");

        let request = AddItemRequest::standard(
            ProductKind::Unknown("bundle".to_string()),
            ItemId::new("X1"),
            1,
        );
        add_item_to_cart(&backend, None, &cart(), &request)
            .await
            .unwrap();

        assert_eq!(backend.cart("c1").items.len(), 1);
        assert_eq!(backend.cart("c1").total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected_without_calls() {
        let backend = RecordingBackend::with_cart("c1");
        let request = AddItemRequest::standard(ProductKind::Simple, ItemId::new("P1"), 0);

        let err = add_item_to_cart(&backend, None, &cart(), &request)
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::InvalidQuantity(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let backend = RecordingBackend::with_cart("c1");
        backend.fail_on("create_cart_item");
        let request = AddItemRequest::standard(ProductKind::Simple, ItemId::new("P1"), 1);

        let err = add_item_to_cart(&backend, None, &cart(), &request)
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::Commerce(_)));
    }

    #[test]
    fn test_compound_total() {
        let materials = vec![
            Material {
                id: ItemId::new("M1"),
                name: "Cheese".to_string(),
                price: price("1.50"),
            },
            Material {
                id: ItemId::new("M2"),
                name: "Avocado".to_string(),
                price: price("2.25"),
            },
        ];
        assert_eq!(
            compound_total(price("10.00"), &materials).unwrap(),
            price("13.75")
        );
        assert_eq!(compound_total(price("10.00"), &[]).unwrap(), price("10.00"));
    }

    #[test]
    fn test_compound_total_overflow() {
        let max = price("79228162514264337593543950335");
        let materials = vec![Material {
            id: ItemId::new("M1"),
            name: "Gold leaf".to_string(),
            price: max,
        }];

        assert!(matches!(
            compound_total(price("1.00"), &materials),
            Err(CartError::PriceOverflow)
        ));
        assert!(matches!(
            compound_total(max, &[materials[0].clone(), materials[0].clone()]),
            Err(CartError::PriceOverflow)
        ));
    }
}

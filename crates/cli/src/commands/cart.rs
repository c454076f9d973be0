//! Cart commands.
//!
//! Each invocation acts as a one-shot session: the cart ID given on the
//! command line seeds an in-memory identity store, and any cart created on
//! the way is reported in the output.

use mercado_core::{CartId, ItemId, Price, ProductKind};
use mercado_storefront::cache::ViewCache;
use mercado_storefront::commerce::{CommerceClient, ShopCart};
use mercado_storefront::config::{CommerceConfig, delivery_item_from_env};
use mercado_storefront::services::cart::{
    AddItemRequest, CartService, MemoryCartIdStore, SessionContext,
};
use serde::Serialize;

use super::{CliError, print_json};

/// Added line plus the cart it landed in.
#[derive(Debug, Serialize)]
struct AddOutcome<'a, T: Serialize> {
    cart: Option<&'a CartId>,
    line: T,
}

fn client() -> Result<CommerceClient, CliError> {
    let config = CommerceConfig::from_env()?;
    Ok(CommerceClient::new(&config)?)
}

fn service() -> Result<CartService<CommerceClient>, CliError> {
    Ok(CartService::new(
        client()?,
        ViewCache::default(),
        delivery_item_from_env()?,
    ))
}

fn session(cart: Option<&str>) -> (SessionContext, MemoryCartIdStore) {
    let cart_id = cart.map(CartId::new);
    (
        SessionContext::new(cart_id.clone(), None),
        MemoryCartIdStore::with_cart_id(cart_id),
    )
}

/// Build an add-to-cart request from command-line arguments.
///
/// # Errors
///
/// Returns `CliError::InvalidArgument` if a compound item has no total, the
/// total is not a price, or materials are given for a non-compound kind.
pub fn build_request(
    item: &str,
    quantity: u32,
    kind: &str,
    materials: Vec<String>,
    total: Option<&str>,
) -> Result<AddItemRequest, CliError> {
    let kind = ProductKind::from(kind);
    let item = ItemId::new(item);

    if kind == ProductKind::Compound {
        let total = total
            .ok_or_else(|| {
                CliError::InvalidArgument("--total is required for compound items".to_string())
            })?
            .parse::<Price>()
            .map_err(|e| CliError::InvalidArgument(format!("--total: {e}")))?;
        let materials = materials.into_iter().map(ItemId::new).collect();
        return Ok(AddItemRequest::compound(item, quantity, materials, total));
    }

    if !materials.is_empty() {
        return Err(CliError::InvalidArgument(format!(
            "--material only applies to compound items, not {kind}"
        )));
    }
    Ok(AddItemRequest::standard(kind, item, quantity))
}

/// Create an empty cart.
///
/// # Errors
///
/// Returns an error if configuration is missing or the API call fails.
pub async fn create() -> Result<(), CliError> {
    let cart = client()?.create_cart(None).await?;
    tracing::info!(cart_id = %cart.id, "Created cart");
    print_json(&cart)
}

/// Show a cart.
///
/// # Errors
///
/// Returns `CliError::CartNotFound` if the API has no such cart.
pub async fn show(cart: &str) -> Result<(), CliError> {
    let service = service()?;
    let (ctx, _) = session(Some(cart));
    let cart: ShopCart = service
        .show(&ctx)
        .await?
        .ok_or_else(|| CliError::CartNotFound(cart.to_string()))?;
    print_json(&cart)
}

/// Add an item to a cart, creating the cart when none is given.
///
/// # Errors
///
/// Returns an error if the quantity is zero or any API call fails.
pub async fn add(cart: Option<&str>, request: &AddItemRequest) -> Result<(), CliError> {
    let service = service()?;
    let (mut ctx, store) = session(cart);
    let line = service.add_item(&mut ctx, &store, request).await?;
    print_json(&AddOutcome {
        cart: ctx.current_cart_id(),
        line,
    })
}

/// Switch a cart to delivery using the configured delivery item.
///
/// # Errors
///
/// Returns `CartError::DeliveryUnavailable` if no delivery item is
/// configured, otherwise the first API failure.
pub async fn delivery(cart: &str) -> Result<(), CliError> {
    let service = service()?;
    let (mut ctx, store) = session(Some(cart));
    let cart = service.switch_to_delivery(&mut ctx, &store, None).await?;
    print_json(&cart)
}

/// Switch a cart to pickup.
///
/// # Errors
///
/// Returns the first API failure.
pub async fn pickup(cart: &str) -> Result<(), CliError> {
    let service = service()?;
    let (mut ctx, store) = session(Some(cart));
    let cart = service.switch_to_pickup(&mut ctx, &store, None).await?;
    print_json(&cart)
}

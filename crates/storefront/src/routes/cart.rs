//! Cart route handlers.
//!
//! Cart IDs are stored in the session; every mutation goes through
//! [`CartService`](crate::services::cart::CartService).

use std::collections::BTreeMap;

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mercado_core::{AddressId, CartId, FulfillmentMode, ItemId, LineItemId, Price, ProductId, ProductKind};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::{DeliveryItem, ShopCart, ShopCartItem};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::cart::{AddItemRequest, CartError, SessionContext, compound_total};
use crate::state::AppState;

/// Cart as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: Option<CartId>,
    pub items: Vec<ShopCartItem>,
    pub item_count: u64,
    pub subtotal: Price,
    pub fulfillment: FulfillmentMode,
    pub shipment_address: Option<AddressId>,
}

impl CartView {
    /// The view of a session without a cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            id: None,
            items: Vec::new(),
            item_count: 0,
            subtotal: Price::ZERO,
            fulfillment: FulfillmentMode::Undetermined,
            shipment_address: None,
        }
    }
}

impl TryFrom<&ShopCart> for CartView {
    type Error = CartError;

    fn try_from(cart: &ShopCart) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: Some(cart.id.clone()),
            items: cart.items.clone(),
            item_count: cart.total_quantity(),
            subtotal: cart.subtotal().ok_or(CartError::PriceOverflow)?,
            fulfillment: cart.fulfillment(),
            shipment_address: cart.shipment_address.clone(),
        })
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
///
/// `attributes` is `name:value` pairs separated by commas (group products);
/// `materials` is comma-separated material item IDs (compound products).
#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    pub product: ProductId,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub attributes: String,
    #[serde(default)]
    pub materials: String,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: u32,
}

/// Optional per-request delivery charge item.
#[derive(Debug, Default, Deserialize)]
pub struct DeliveryForm {
    pub delivery_item: Option<ItemId>,
    pub delivery_price: Option<Price>,
}

impl DeliveryForm {
    fn delivery_item(self) -> Result<Option<DeliveryItem>> {
        match (self.delivery_item, self.delivery_price) {
            (None, None) => Ok(None),
            (Some(id), Some(price)) => Ok(Some(DeliveryItem { id, price })),
            _ => Err(AppError::BadRequest(
                "delivery_item and delivery_price must be given together".to_string(),
            )),
        }
    }
}

/// Assign address form data.
#[derive(Debug, Deserialize)]
pub struct AddressForm {
    pub address: AddressId,
}

/// Parse `size:L,color:red` into attribute selections.
fn parse_attributes(raw: &str) -> Result<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            pair.split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .filter(|(name, value)| !name.is_empty() && !value.is_empty())
                .ok_or_else(|| AppError::BadRequest(format!("Invalid attribute '{pair}'")))
        })
        .collect()
}

/// Parse comma-separated material IDs.
fn parse_materials(raw: &str) -> Vec<ItemId> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ItemId::new)
        .collect()
}

/// Resolve the form's product into a concrete add-to-cart request.
async fn resolve_request(state: &AppState, form: &AddItemForm) -> Result<AddItemRequest> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(CartError::InvalidQuantity("quantity must be at least 1".to_string()).into());
    }
    let product = state
        .commerce()
        .get_product(&form.product)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product)))?;

    match &product.kind {
        ProductKind::Group => {
            let attributes = parse_attributes(&form.attributes)?;
            let variant = state
                .commerce()
                .resolve_variant(&product.id, &attributes)
                .await?
                .ok_or_else(|| {
                    AppError::BadRequest("No variant matches the selected options".to_string())
                })?;
            Ok(AddItemRequest::standard(ProductKind::Group, variant.id, quantity))
        }
        ProductKind::Compound => {
            let item = product.item.clone().ok_or_else(|| {
                AppError::Internal(format!("compound product {} has no item", product.id))
            })?;
            let wanted = parse_materials(&form.materials);
            let available = state.commerce().list_materials(&product.id).await?.results;
            let selected: Vec<_> = available
                .into_iter()
                .filter(|material| wanted.contains(&material.id))
                .collect();
            if selected.len() != wanted.len() {
                return Err(AppError::BadRequest(
                    "Unknown material selected".to_string(),
                ));
            }
            let total = compound_total(product.price, &selected)?;
            Ok(AddItemRequest::compound(item, quantity, wanted, total))
        }
        kind => {
            let item = product
                .item
                .clone()
                .unwrap_or_else(|| ItemId::new(product.id.as_str()));
            Ok(AddItemRequest::standard(kind.clone(), item, quantity))
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the current cart.
#[instrument(skip(state, ctx))]
pub async fn show(State(state): State<AppState>, ctx: SessionContext) -> Result<Json<CartView>> {
    let view = match state.cart().show(&ctx).await? {
        Some(cart) => CartView::try_from(&cart)?,
        None => CartView::empty(),
    };
    Ok(Json(view))
}

/// Add an item to the cart, creating the cart if needed.
#[instrument(skip(state, session, ctx))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    mut ctx: SessionContext,
    Form(form): Form<AddItemForm>,
) -> Result<(StatusCode, Json<ShopCartItem>)> {
    let request = resolve_request(&state, &form).await?;
    let line = state.cart().add_item(&mut ctx, &session, &request).await?;

    add_breadcrumb("cart", "Added item", Some(&[("item", line.item.as_str())]));
    Ok((StatusCode::CREATED, Json(line)))
}

/// Set the quantity of a line; zero removes it.
#[instrument(skip(state, ctx))]
pub async fn adjust_quantity(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(line): Path<LineItemId>,
    Form(form): Form<QuantityForm>,
) -> Result<Response> {
    let updated = state
        .cart()
        .adjust_quantity(&ctx, &line, form.quantity)
        .await?;

    Ok(match updated {
        Some(line) => Json(line).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Remove a line.
#[instrument(skip(state, ctx))]
pub async fn remove_item(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(line): Path<LineItemId>,
) -> Result<StatusCode> {
    state.cart().remove_item(&ctx, &line).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Switch the cart to delivery.
#[instrument(skip(state, session, ctx))]
pub async fn delivery(
    State(state): State<AppState>,
    session: Session,
    mut ctx: SessionContext,
    Form(form): Form<DeliveryForm>,
) -> Result<Json<CartView>> {
    let delivery = form.delivery_item()?;
    let cart = state
        .cart()
        .switch_to_delivery(&mut ctx, &session, delivery.as_ref())
        .await?;
    Ok(Json(CartView::try_from(&cart)?))
}

/// Switch the cart to pickup.
#[instrument(skip(state, session, ctx))]
pub async fn pickup(
    State(state): State<AppState>,
    session: Session,
    mut ctx: SessionContext,
    Form(form): Form<DeliveryForm>,
) -> Result<Json<CartView>> {
    let delivery = form.delivery_item()?;
    let cart = state
        .cart()
        .switch_to_pickup(&mut ctx, &session, delivery.as_ref())
        .await?;
    Ok(Json(CartView::try_from(&cart)?))
}

/// Assign the shipment address.
#[instrument(skip(state, ctx))]
pub async fn assign_address(
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<AddressForm>,
) -> Result<Json<CartView>> {
    let cart = state.cart().assign_address(&ctx, &form.address).await?;
    Ok(Json(CartView::try_from(&cart)?))
}

/// Forget the session's cart.
#[instrument(skip(state, session, ctx))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    mut ctx: SessionContext,
) -> Result<StatusCode> {
    state.cart().clear(&mut ctx, &session).await?;
    Ok(StatusCode::NO_CONTENT)
}

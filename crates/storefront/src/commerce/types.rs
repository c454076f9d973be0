//! Domain types mirrored from the commerce REST API.
//!
//! Every entity here is owned remotely; the storefront only holds these as
//! ephemeral, per-request copies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mercado_core::{
    AddressId, CartId, FulfillmentMode, ItemId, LineItemId, OrderId, OrderStatus, PostalCode,
    Price, ProductId, ProductKind, TaxonomyId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Pagination
// =============================================================================

/// List envelope returned by every collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub results: Vec<T>,
    /// Total number of matching items across all pages.
    pub count: u64,
    /// URL of the next page, if any.
    pub next: Option<String>,
    /// URL of the previous page, if any.
    pub previous: Option<String>,
}

impl<T> Page<T> {
    /// An empty page, used when reads degrade on an unreachable backend.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            results: Vec::new(),
            count: 0,
            next: None,
            previous: None,
        }
    }

    /// Whether there is another page after this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// A remotely-owned cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopCart {
    pub id: CartId,
    #[serde(default)]
    pub items: Vec<ShopCartItem>,
    #[serde(default)]
    pub for_delivery: bool,
    #[serde(default)]
    pub for_pickup: bool,
    #[serde(default)]
    pub shipment_address: Option<AddressId>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

impl ShopCart {
    /// Current fulfillment mode derived from the cart flags.
    #[must_use]
    pub fn fulfillment(&self) -> FulfillmentMode {
        FulfillmentMode::from_flags(!self.items.is_empty(), self.for_delivery, self.for_pickup)
    }

    /// Total number of units across all lines, saturating at `u64::MAX`.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|line| u64::from(line.quantity))
            .fold(0, u64::saturating_add)
    }

    /// Sum of `price * quantity` for every line, `None` on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        self.items
            .iter()
            .try_fold(Price::ZERO, |total, line| total.checked_add(line.line_total()?))
    }

    /// Find the line referencing an item, if present.
    #[must_use]
    pub fn line_for(&self, item: &ItemId) -> Option<&ShopCartItem> {
        self.items.iter().find(|line| &line.item == item)
    }
}

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopCartItem {
    pub id: LineItemId,
    pub cart: CartId,
    pub item: ItemId,
    pub quantity: u32,
    /// Unit price, or the compound price for compound lines.
    pub price: Price,
    #[serde(default)]
    pub materials: Vec<ItemId>,
}

impl ShopCartItem {
    /// Price of the whole line, `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.price.checked_mul(self.quantity)
    }
}

/// Body for creating a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCartItem {
    pub cart: CartId,
    pub item: ItemId,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<ItemId>,
}

/// Body for updating cart-level fulfillment fields.
///
/// `shipment_address` and `external_reference` use a double option so that
/// "leave unchanged" (field omitted) and "clear" (`null`) are distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_delivery: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_pickup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_address: Option<Option<AddressId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<Option<String>>,
}

impl CartUpdate {
    /// Flags for delivery fulfillment.
    #[must_use]
    pub const fn delivery() -> Self {
        Self {
            for_delivery: Some(true),
            for_pickup: Some(false),
            shipment_address: None,
            external_reference: None,
        }
    }

    /// Flags for pickup fulfillment; pickup orders carry no shipping address.
    #[must_use]
    pub const fn pickup() -> Self {
        Self {
            for_delivery: Some(false),
            for_pickup: Some(true),
            shipment_address: Some(None),
            external_reference: Some(None),
        }
    }

    /// Assign a shipment address without touching the flags.
    #[must_use]
    pub const fn address(address: AddressId) -> Self {
        Self {
            for_delivery: None,
            for_pickup: None,
            shipment_address: Some(Some(address)),
            external_reference: None,
        }
    }
}

/// The synthetic line item representing a delivery charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryItem {
    pub id: ItemId,
    pub price: Price,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// A product as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub kind: ProductKind,
    pub price: Price,
    /// Purchasable item for simple and compound products.
    #[serde(default)]
    pub item: Option<ItemId>,
    #[serde(default)]
    pub description: Option<String>,
    /// Selectable attribute names and their values, for group products.
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub taxonomies: Vec<TaxonomyId>,
}

/// A concrete variant of a group product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: ItemId,
    pub price: Price,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// An extra material selectable on a compound product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: ItemId,
    pub name: String,
    pub price: Price,
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub id: TaxonomyId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: Option<TaxonomyId>,
}

/// Search filters for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl ProductQuery {
    /// Stable cache key for this query.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "products:{}:{}:{}",
            self.search.as_deref().unwrap_or(""),
            self.taxonomy.as_deref().unwrap_or(""),
            self.page.unwrap_or(1)
        )
    }
}

// =============================================================================
// Account Types
// =============================================================================

/// A customer address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub name: String,
    pub street: String,
    pub postal_code: PostalCode,
    pub state: String,
    pub city: String,
    pub suburb: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Body for creating or replacing an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub name: String,
    pub street: String,
    pub postal_code: PostalCode,
    pub state: String,
    pub city: String,
    pub suburb: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Token envelope returned by login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// =============================================================================
// Order Types
// =============================================================================

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: ItemId,
    pub quantity: u32,
    pub price: Price,
}

/// An order created from a cart after successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    pub total: Price,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub shipment_address: Option<AddressId>,
    #[serde(default)]
    pub for_delivery: bool,
    #[serde(default)]
    pub for_pickup: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payment submission that turns a cart into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Opaque payment-method token from the payment provider.
    pub payment_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

//! Status and kind enums shared across the storefront.

use serde::{Deserialize, Serialize};

/// How a product is merged into a cart.
///
/// The commerce API reports this as a lowercase string. Kinds this crate
/// does not know about are preserved in [`ProductKind::Unknown`] instead of
/// failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductKind {
    /// A single purchasable item.
    #[default]
    Simple,
    /// A product whose attribute selection resolves to a concrete variant.
    Group,
    /// A base item plus selectable extra materials.
    Compound,
    /// A kind reported by the API that is not handled explicitly.
    Unknown(String),
}

impl ProductKind {
    /// Wire representation of this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Simple => "simple",
            Self::Group => "group",
            Self::Compound => "compound",
            Self::Unknown(raw) => raw,
        }
    }

    /// Whether adding this kind twice should merge into one cart line.
    #[must_use]
    pub const fn merges_duplicates(&self) -> bool {
        !matches!(self, Self::Compound)
    }
}

impl From<&str> for ProductKind {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "simple" => Self::Simple,
            "group" | "group-variant" | "variant" => Self::Group,
            "compound" => Self::Compound,
            _ => Self::Unknown(raw.to_owned()),
        }
    }
}

impl From<String> for ProductKind {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<ProductKind> for String {
    fn from(kind: ProductKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fulfillment mode of a cart, derived from its `for_delivery`/`for_pickup` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentMode {
    /// No lines yet, or neither flag set.
    #[default]
    Undetermined,
    /// Shipped to an address; carries a delivery line item.
    Delivery,
    /// Collected in store; carries no shipping address.
    Pickup,
}

impl FulfillmentMode {
    /// Derive the mode from cart flags.
    ///
    /// Both flags set is not a valid remote state; it is reported as
    /// `Undetermined` so callers re-select a mode.
    #[must_use]
    pub const fn from_flags(has_lines: bool, for_delivery: bool, for_pickup: bool) -> Self {
        match (has_lines, for_delivery, for_pickup) {
            (true, true, false) => Self::Delivery,
            (true, false, true) => Self::Pickup,
            _ => Self::Undetermined,
        }
    }
}

/// Order status as reported by the commerce API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Preparing,
    Shipped,
    ReadyForPickup,
    Completed,
    Cancelled,
    #[serde(other)]
    Other,
}

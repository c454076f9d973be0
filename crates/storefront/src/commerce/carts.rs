//! Cart and cart-line endpoints.

use mercado_core::{AuthToken, CartId, ItemId, LineItemId};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use super::client::segment;
use super::{CartUpdate, CommerceClient, CommerceError, NewCartItem, Page, ShopCart, ShopCartItem};

#[derive(Debug, Serialize)]
struct CartItemFilter<'a> {
    cart: &'a str,
    item: &'a str,
}

impl CommerceClient {
    // =========================================================================
    // Carts
    // =========================================================================

    /// Create a new, empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn create_cart(&self, token: Option<&AuthToken>) -> Result<ShopCart, CommerceError> {
        self.post("carts/", &json!({}), token).await
    }

    /// Fetch a cart; `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    pub async fn get_cart(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
    ) -> Result<Option<ShopCart>, CommerceError> {
        self.get_detail(&format!("carts/{}/", segment(cart_id.as_str())), token)
            .await
    }

    /// Update cart-level flags, address or reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    pub async fn update_cart(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
        update: &CartUpdate,
    ) -> Result<ShopCart, CommerceError> {
        self.patch(&format!("carts/{}/", segment(cart_id.as_str())), update, token)
            .await
    }

    // =========================================================================
    // Cart Lines
    // =========================================================================

    /// Look up the line for `item` in a cart.
    ///
    /// This lookup feeds mutations, so it never degrades to an empty answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(cart_id = %cart_id, item = %item))]
    pub async fn find_cart_item(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
        item: &ItemId,
    ) -> Result<Option<ShopCartItem>, CommerceError> {
        let filter = CartItemFilter {
            cart: cart_id.as_str(),
            item: item.as_str(),
        };
        let page: Page<ShopCartItem> = self.get("cart-items/", Some(&filter), token).await?;
        if page.count == 0 {
            return Ok(None);
        }
        Ok(page.results.into_iter().next())
    }

    /// Create a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, line), fields(cart_id = %line.cart, item = %line.item))]
    pub async fn create_cart_item(
        &self,
        token: Option<&AuthToken>,
        line: &NewCartItem,
    ) -> Result<ShopCartItem, CommerceError> {
        self.post("cart-items/", line, token).await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(line = %line))]
    pub async fn update_cart_item_quantity(
        &self,
        token: Option<&AuthToken>,
        line: &LineItemId,
        quantity: u32,
    ) -> Result<ShopCartItem, CommerceError> {
        self.patch(
            &format!("cart-items/{}/", segment(line.as_str())),
            &json!({ "quantity": quantity }),
            token,
        )
        .await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(line = %line))]
    pub async fn remove_cart_item(
        &self,
        token: Option<&AuthToken>,
        line: &LineItemId,
    ) -> Result<(), CommerceError> {
        self.delete(&format!("cart-items/{}/", segment(line.as_str())), token)
            .await
    }
}

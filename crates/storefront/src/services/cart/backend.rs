//! The cart operations the orchestration layer needs from the commerce API.

use std::future::Future;

use mercado_core::{AuthToken, CartId, ItemId, LineItemId};

use crate::commerce::{
    CartUpdate, CommerceClient, CommerceError, NewCartItem, Order, PaymentRequest, ShopCart,
    ShopCartItem,
};

/// Remote cart operations.
///
/// [`CommerceClient`] is the production implementation.
pub trait CartBackend: Send + Sync {
    fn create_cart(
        &self,
        token: Option<&AuthToken>,
    ) -> impl Future<Output = Result<ShopCart, CommerceError>> + Send;

    fn get_cart(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<Option<ShopCart>, CommerceError>> + Send;

    fn update_cart(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
        update: &CartUpdate,
    ) -> impl Future<Output = Result<ShopCart, CommerceError>> + Send;

    fn find_cart_item(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
        item: &ItemId,
    ) -> impl Future<Output = Result<Option<ShopCartItem>, CommerceError>> + Send;

    fn create_cart_item(
        &self,
        token: Option<&AuthToken>,
        line: &NewCartItem,
    ) -> impl Future<Output = Result<ShopCartItem, CommerceError>> + Send;

    fn update_cart_item_quantity(
        &self,
        token: Option<&AuthToken>,
        line: &LineItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<ShopCartItem, CommerceError>> + Send;

    fn remove_cart_item(
        &self,
        token: Option<&AuthToken>,
        line: &LineItemId,
    ) -> impl Future<Output = Result<(), CommerceError>> + Send;

    fn pay_cart(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
        payment: &PaymentRequest,
    ) -> impl Future<Output = Result<Order, CommerceError>> + Send;
}

impl CartBackend for CommerceClient {
    async fn create_cart(&self, token: Option<&AuthToken>) -> Result<ShopCart, CommerceError> {
        Self::create_cart(self, token).await
    }

    async fn get_cart(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
    ) -> Result<Option<ShopCart>, CommerceError> {
        Self::get_cart(self, token, cart_id).await
    }

    async fn update_cart(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
        update: &CartUpdate,
    ) -> Result<ShopCart, CommerceError> {
        Self::update_cart(self, token, cart_id, update).await
    }

    async fn find_cart_item(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
        item: &ItemId,
    ) -> Result<Option<ShopCartItem>, CommerceError> {
        Self::find_cart_item(self, token, cart_id, item).await
    }

    async fn create_cart_item(
        &self,
        token: Option<&AuthToken>,
        line: &NewCartItem,
    ) -> Result<ShopCartItem, CommerceError> {
        Self::create_cart_item(self, token, line).await
    }

    async fn update_cart_item_quantity(
        &self,
        token: Option<&AuthToken>,
        line: &LineItemId,
        quantity: u32,
    ) -> Result<ShopCartItem, CommerceError> {
        Self::update_cart_item_quantity(self, token, line, quantity).await
    }

    async fn remove_cart_item(
        &self,
        token: Option<&AuthToken>,
        line: &LineItemId,
    ) -> Result<(), CommerceError> {
        Self::remove_cart_item(self, token, line).await
    }

    async fn pay_cart(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
        payment: &PaymentRequest,
    ) -> Result<Order, CommerceError> {
        Self::pay_cart(self, token, cart_id, payment).await
    }
}

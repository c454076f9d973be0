//! Payment and order endpoints.

use mercado_core::{AuthToken, CartId, OrderId};
use tracing::instrument;

use super::client::segment;
use super::{CommerceClient, CommerceError, Order, PaymentRequest};

impl CommerceClient {
    /// Pay for a cart. On success the API converts it into an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is rejected or the request fails.
    #[instrument(skip(self, token, payment), fields(cart_id = %cart_id))]
    pub async fn pay_cart(
        &self,
        token: Option<&AuthToken>,
        cart_id: &CartId,
        payment: &PaymentRequest,
    ) -> Result<Order, CommerceError> {
        self.post(&format!("carts/{}/pay/", segment(cart_id.as_str())), payment, token)
            .await
    }

    /// Fetch an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(
        &self,
        token: Option<&AuthToken>,
        id: &OrderId,
    ) -> Result<Option<Order>, CommerceError> {
        self.get_detail(&format!("orders/{}/", segment(id.as_str())), token)
            .await
    }

    /// The in-progress order for the current customer, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn active_order(&self, token: Option<&AuthToken>) -> Result<Option<Order>, CommerceError> {
        self.get_detail("orders/active/", token).await
    }
}

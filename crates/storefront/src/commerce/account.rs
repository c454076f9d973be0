//! Authentication and address book endpoints.

use mercado_core::{AddressId, AuthToken, Email};
use serde::Serialize;
use tracing::instrument;

use super::client::segment;
use super::{Address, AddressInput, CommerceClient, CommerceError, Page, TokenResponse};

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a Email,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct Registration<'a> {
    email: &'a Email,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ResetRequest<'a> {
    email: &'a Email,
}

impl CommerceClient {
    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for a customer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &Email, password: &str) -> Result<AuthToken, CommerceError> {
        let response: TokenResponse = self
            .post("auth/login/", &Credentials { email, password }, None)
            .await?;
        Ok(AuthToken::new(response.token))
    }

    /// Create a customer account and return its token.
    ///
    /// # Errors
    ///
    /// Returns an error if registration is rejected or the request fails.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        email: &Email,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthToken, CommerceError> {
        let body = Registration {
            email,
            password,
            name,
        };
        let response: TokenResponse = self.post("auth/register/", &body, None).await?;
        Ok(AuthToken::new(response.token))
    }

    /// Revoke a customer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &AuthToken) -> Result<(), CommerceError> {
        self.post_no_content("auth/logout/", &serde_json::json!({}), Some(token))
            .await
    }

    /// Ask the API to send a password reset message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn password_reset(&self, email: &Email) -> Result<(), CommerceError> {
        self.post_no_content("auth/password-reset/", &ResetRequest { email }, None)
            .await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// List the customer's addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_addresses(&self, token: &AuthToken) -> Result<Page<Address>, CommerceError> {
        self.get_list::<Address, ()>("addresses/", None, Some(token))
            .await
    }

    /// Create an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is rejected or the request fails.
    #[instrument(skip(self, token, input))]
    pub async fn create_address(
        &self,
        token: &AuthToken,
        input: &AddressInput,
    ) -> Result<Address, CommerceError> {
        self.post("addresses/", input, Some(token)).await
    }

    /// Replace the fields of an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is rejected or the request fails.
    #[instrument(skip(self, token, input), fields(address_id = %id))]
    pub async fn update_address(
        &self,
        token: &AuthToken,
        id: &AddressId,
        input: &AddressInput,
    ) -> Result<Address, CommerceError> {
        self.patch(&format!("addresses/{}/", segment(id.as_str())), input, Some(token))
            .await
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(address_id = %id))]
    pub async fn delete_address(&self, token: &AuthToken, id: &AddressId) -> Result<(), CommerceError> {
        self.delete(&format!("addresses/{}/", segment(id.as_str())), Some(token))
            .await
    }
}

//! Account route handlers (require auth).

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
};
use mercado_core::{AddressId, PostalCode};
use serde::Deserialize;
use tracing::instrument;

use crate::commerce::{Address, AddressInput, Page};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Address form data.
#[derive(Debug, Deserialize)]
pub struct AddressForm {
    pub name: String,
    pub street: String,
    pub postal_code: String,
    pub state: String,
    pub city: String,
    pub suburb: String,
    pub phone: Option<String>,
}

impl TryFrom<AddressForm> for AddressInput {
    type Error = AppError;

    fn try_from(form: AddressForm) -> Result<Self> {
        let postal_code = PostalCode::parse(&form.postal_code)
            .map_err(|e| AppError::BadRequest(format!("Invalid postal code: {e}")))?;
        for (field, value) in [
            ("name", &form.name),
            ("street", &form.street),
            ("state", &form.state),
            ("city", &form.city),
            ("suburb", &form.suburb),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::BadRequest(format!("{field} is required")));
            }
        }

        Ok(Self {
            name: form.name.trim().to_string(),
            street: form.street.trim().to_string(),
            postal_code,
            state: form.state.trim().to_string(),
            city: form.city.trim().to_string(),
            suburb: form.suburb.trim().to_string(),
            phone: form
                .phone
                .map(|phone| phone.trim().to_string())
                .filter(|phone| !phone.is_empty()),
        })
    }
}

/// List the customer's addresses.
#[instrument(skip_all)]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(token): RequireAuth,
) -> Result<Json<Page<Address>>> {
    Ok(Json(state.commerce().list_addresses(&token).await?))
}

/// Create an address.
#[instrument(skip_all)]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(token): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Result<(StatusCode, Json<Address>)> {
    let input = AddressInput::try_from(form)?;
    let address = state.commerce().create_address(&token, &input).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// Update an address.
#[instrument(skip(state, token, form))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(token): RequireAuth,
    Path(id): Path<AddressId>,
    Form(form): Form<AddressForm>,
) -> Result<Json<Address>> {
    let input = AddressInput::try_from(form)?;
    Ok(Json(state.commerce().update_address(&token, &id, &input).await?))
}

/// Delete an address.
#[instrument(skip(state, token))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(token): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    state.commerce().delete_address(&token, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

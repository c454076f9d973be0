//! Session extractors.
//!
//! [`SessionContext`] is built from the `tower_sessions::Session` at the
//! start of each request so cart operations never touch the session
//! implicitly.

use axum::{extract::FromRequestParts, http::request::Parts};
use mercado_core::AuthToken;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session::keys;
use crate::services::cart::{CartIdStore, SessionContext};

fn session(parts: &Parts) -> Result<&Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session(parts)?;
        let cart_id = session.load_cart_id().await?;
        let auth_token = session.get::<AuthToken>(keys::AUTH_TOKEN).await?;

        Ok(Self {
            cart_id,
            auth_token,
            view_key: session.id().map(|id| id.to_string()),
        })
    }
}

/// Extractor that requires a logged-in customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn addresses(RequireAuth(token): RequireAuth) -> Result<Json<Page<Address>>> {
///     // Use token for customer-scoped commerce API calls
/// }
/// ```
pub struct RequireAuth(pub AuthToken);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session(parts)?
            .get::<AuthToken>(keys::AUTH_TOKEN)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Please log in to continue".to_string()))
    }
}

/// Store the customer token in the session.
///
/// The session ID is rotated to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_token(
    session: &Session,
    token: &AuthToken,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::AUTH_TOKEN, token).await
}

/// Remove the customer token from the session.
///
/// The session ID is rotated as on login; the cart ID is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_token(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<AuthToken>(keys::AUTH_TOKEN).await?;
    session.cycle_id().await
}

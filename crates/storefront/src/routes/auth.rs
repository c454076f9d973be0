//! Authentication route handlers.
//!
//! Credentials are checked by the commerce API; the session only keeps the
//! token it issues.

use axum::{Form, extract::State, http::StatusCode};
use mercado_core::Email;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::middleware::{clear_auth_token, set_auth_token};
use crate::routes::orders::active_order_key;
use crate::services::cart::SessionContext;
use crate::state::AppState;

/// Minimum password length accepted before calling the API.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Password reset form data.
#[derive(Debug, Deserialize)]
pub struct PasswordResetForm {
    pub email: String,
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|_| AppError::BadRequest("Invalid email address".to_string()))
}

/// Log in and keep the customer token in the session.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<StatusCode> {
    let email = parse_email(&form.email)?;
    let token = state.commerce().login(&email, &form.password).await?;
    set_auth_token(&session, &token).await?;

    info!("Customer logged in");
    Ok(StatusCode::NO_CONTENT)
}

/// Register and log in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<StatusCode> {
    let email = parse_email(&form.email)?;
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let name = form.name.as_deref().map(str::trim).filter(|name| !name.is_empty());
    let token = state
        .commerce()
        .register(&email, &form.password, name)
        .await?;
    set_auth_token(&session, &token).await?;

    info!("Customer registered");
    Ok(StatusCode::CREATED)
}

/// Revoke the token and drop it from the session. The cart is kept.
///
/// The session ID is rotated and the customer's active order is evicted,
/// so nothing cached while logged in is served afterwards.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    ctx: SessionContext,
) -> Result<StatusCode> {
    if let Some(token) = ctx.token() {
        state.commerce().logout(token).await?;
    }
    clear_auth_token(&session).await?;
    if let Some(view_key) = &ctx.view_key {
        state.views().remove(&active_order_key(view_key)).await;
    }

    info!("Customer logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Request a password reset email.
///
/// Answers `202` whether or not the address has an account.
#[instrument(skip_all)]
pub async fn password_reset(
    State(state): State<AppState>,
    Form(form): Form<PasswordResetForm>,
) -> Result<StatusCode> {
    let email = parse_email(&form.email)?;
    match state.commerce().password_reset(&email).await {
        Ok(()) | Err(crate::commerce::CommerceError::Api { status: 404, .. }) => {
            Ok(StatusCode::ACCEPTED)
        }
        Err(e) => Err(e.into()),
    }
}

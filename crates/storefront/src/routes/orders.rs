//! Checkout and order route handlers.

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
};
use mercado_core::{Email, OrderId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::cache::{CachedView, ViewTag};
use crate::commerce::{Order, PaymentRequest};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::cart::SessionContext;
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub payment_token: String,
    pub email: Option<String>,
}

/// Pay for the cart; on success the session's cart is forgotten.
#[instrument(skip(state, session, ctx, form))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    mut ctx: SessionContext,
    Form(form): Form<CheckoutForm>,
) -> Result<(StatusCode, Json<Order>)> {
    if form.payment_token.trim().is_empty() {
        return Err(AppError::BadRequest("payment_token is required".to_string()));
    }
    let email = form
        .email
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(Email::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("Invalid email address: {e}")))?;

    let payment = PaymentRequest {
        payment_token: form.payment_token,
        email: email.map(|email| email.as_str().to_string()),
    };
    let order = state.cart().checkout(&mut ctx, &session, &payment).await?;

    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
    Ok((StatusCode::CREATED, Json(order)))
}

/// Cache key of a session's active order.
pub(crate) fn active_order_key(view_key: &str) -> String {
    format!("active-order:{view_key}")
}

/// The active order for this session, if any.
#[instrument(skip(state, ctx))]
pub async fn active(
    State(state): State<AppState>,
    ctx: SessionContext,
) -> Result<Json<Option<Order>>> {
    let key = ctx.view_key.as_deref().map(active_order_key);
    if let Some(key) = &key
        && let Some(CachedView::Order(order)) = state.views().get(key).await
    {
        return Ok(Json(order.map(|order| *order)));
    }

    let snapshot = state.views().snapshot(&[ViewTag::ActiveOrder]);
    let order = state.commerce().active_order(ctx.token()).await?;
    if let Some(key) = key {
        state
            .views()
            .insert(
                key,
                CachedView::Order(order.clone().map(Box::new)),
                &[ViewTag::ActiveOrder],
                snapshot,
            )
            .await;
    }
    Ok(Json(order))
}

/// Order detail.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: SessionContext,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    state
        .commerce()
        .get_order(ctx.token(), &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

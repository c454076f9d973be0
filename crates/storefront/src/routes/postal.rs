//! Postal-code lookup route handler.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::postal::PostalLookup;
use crate::state::AppState;

/// Resolve a postal code to candidate states, cities and suburbs.
#[instrument(skip(state))]
pub async fn lookup(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<PostalLookup>> {
    let postal = state.postal().ok_or_else(|| {
        AppError::ServiceUnavailable("Postal code lookup is not configured".to_string())
    })?;
    Ok(Json(postal.lookup(&code).await?))
}

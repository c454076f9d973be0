//! Catalog route handlers.
//!
//! Catalog reads are cached in the view cache under the `catalog`,
//! `product:{id}` and `collection:{slug}` tags. Empty listings are not
//! cached, since they may be a degraded answer from an unreachable API.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use mercado_core::ProductId;
use tracing::instrument;

use crate::cache::{CachedView, ViewTag};
use crate::commerce::{Page, Product, ProductQuery, Taxonomy};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Search the catalog.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<Product>>> {
    let key = query.cache_key();
    if let Some(CachedView::Products(page)) = state.views().get(&key).await {
        return Ok(Json(page));
    }

    let mut tags = vec![ViewTag::Catalog];
    if let Some(slug) = &query.taxonomy {
        tags.push(ViewTag::Collection(slug.clone()));
    }
    let snapshot = state.views().snapshot(&tags);
    let page = state.commerce().search_products(&query).await?;
    if page.count > 0 {
        state
            .views()
            .insert(key, CachedView::Products(page.clone()), &tags, snapshot)
            .await;
    }
    Ok(Json(page))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let key = format!("product:{id}");
    if let Some(CachedView::Product(product)) = state.views().get(&key).await {
        return Ok(Json(*product));
    }

    let tags = [ViewTag::Product(id.clone()), ViewTag::Catalog];
    let snapshot = state.views().snapshot(&tags);
    let product = state
        .commerce()
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    state
        .views()
        .insert(
            key,
            CachedView::Product(Box::new(product.clone())),
            &tags,
            snapshot,
        )
        .await;
    Ok(Json(product))
}

/// Category listing.
#[instrument(skip(state))]
pub async fn taxonomies(State(state): State<AppState>) -> Result<Json<Page<Taxonomy>>> {
    const KEY: &str = "taxonomies";
    if let Some(CachedView::Taxonomies(page)) = state.views().get(KEY).await {
        return Ok(Json(page));
    }

    let snapshot = state.views().snapshot(&[ViewTag::Catalog]);
    let page = state.commerce().list_taxonomies().await?;
    if page.count > 0 {
        state
            .views()
            .insert(
                KEY,
                CachedView::Taxonomies(page.clone()),
                &[ViewTag::Catalog],
                snapshot,
            )
            .await;
    }
    Ok(Json(page))
}

//! Product, variant, material and taxonomy reads.
//!
//! Every call here is a degradable read.

use std::collections::BTreeMap;

use mercado_core::ProductId;
use tracing::instrument;

use super::client::segment;
use super::{CommerceClient, CommerceError, Material, Page, Product, ProductQuery, Taxonomy, Variant};

impl CommerceClient {
    /// Search the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &ProductQuery) -> Result<Page<Product>, CommerceError> {
        self.get_list("products/", Some(query), None).await
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CommerceError> {
        self.get_detail(&format!("products/{}/", segment(id.as_str())), None)
            .await
    }

    /// Resolve selected attribute values of a group product to its variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, attributes), fields(product_id = %id))]
    pub async fn resolve_variant(
        &self,
        id: &ProductId,
        attributes: &BTreeMap<String, String>,
    ) -> Result<Option<Variant>, CommerceError> {
        let path = format!("products/{}/variant/", segment(id.as_str()));
        match self.get::<Variant, _>(&path, Some(attributes), None).await {
            Ok(variant) => Ok(Some(variant)),
            Err(CommerceError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List the extra materials selectable on a compound product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn list_materials(&self, id: &ProductId) -> Result<Page<Material>, CommerceError> {
        self.get_list::<Material, ()>(&format!("products/{}/materials/", segment(id.as_str())), None, None)
            .await
    }

    /// List catalog categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_taxonomies(&self) -> Result<Page<Taxonomy>, CommerceError> {
        self.get_list::<Taxonomy, ()>("taxonomies/", None, None).await
    }

    /// Readiness probe: the commerce API answers a cheap read.
    ///
    /// # Errors
    ///
    /// Returns an error if the API does not answer successfully.
    pub async fn ping(&self) -> Result<(), CommerceError> {
        self.get::<serde_json::Value, ()>("taxonomies/", None, None)
            .await
            .map(drop)
    }
}

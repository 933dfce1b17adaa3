//! Catalog endpoints.

use reqwest::Method;
use tracing::instrument;

use furnistore_core::ProductId;

use super::wire::{ProductBody, ProductsBody};
use super::{ApiClient, ApiError};
use crate::config::Language;
use crate::models::Product;

impl ApiClient {
    /// List the catalog, with names localized for `language` where the
    /// backend supports it.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or a product has an unrecognized
    /// shape.
    #[instrument(skip(self))]
    pub async fn list_products(&self, language: Language) -> Result<Vec<Product>, ApiError> {
        let builder = self
            .request(Method::GET, "/products")
            .query(&[("lang", language.code())]);
        let body: ProductsBody = self.send_json(builder).await?;
        body.into_products()?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 404 for an unknown product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let body: ProductBody = self
            .send_json(self.request(Method::GET, &format!("/products/{id}")))
            .await?;
        Product::try_from(body.into_product())
    }
}

//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use furnistore_core::ProductId;

use crate::error::{MockError, Result};
use crate::state::{AppState, Product};

/// A product as the catalog endpoints send it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBody {
    pub id: ProductId,
    pub name_en: &'static str,
    pub name_zh: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub images: Vec<ImageBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBody {
    pub image_url: &'static str,
}

impl From<&Product> for ProductBody {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name_en: product.name_en,
            name_zh: product.name_zh,
            price: product.price,
            images: vec![ImageBody {
                image_url: product.image_url,
            }],
        }
    }
}

/// List the catalog as a bare array. No sign-in needed.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<ProductBody>> {
    let store = state.store().await;
    Json(store.products().iter().map(ProductBody::from).collect())
}

/// One product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductBody>> {
    let store = state.store().await;
    store
        .product(ProductId::new(id))
        .map(|product| Json(ProductBody::from(product)))
        .ok_or(MockError::NotFound("Product"))
}

//! Cart endpoints.

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use furnistore_core::{CartItemId, ProductId};

use super::wire::{CartEnvelope, Status};
use super::{ApiClient, ApiError, CartStore};
use crate::models::CartSnapshot;

#[async_trait]
impl CartStore for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<CartSnapshot, ApiError> {
        let envelope: CartEnvelope = self.send_json(self.request(Method::GET, "/cart")).await?;
        envelope.status.check()?;
        envelope
            .cart
            .map_or_else(|| Ok(CartSnapshot::empty()), CartSnapshot::try_from)
    }

    #[instrument(skip(self))]
    async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        let form = [
            ("productId", product_id.to_string()),
            ("quantity", quantity.to_string()),
        ];
        let status: Status = self
            .send_json(self.request(Method::POST, "/cart/items").form(&form))
            .await?;
        status.check()
    }

    #[instrument(skip(self))]
    async fn update_item(&self, item_id: CartItemId, quantity: u32) -> Result<(), ApiError> {
        if quantity == 0 {
            return Err(ApiError::Rejected(Some(
                "Quantity must be at least 1".to_string(),
            )));
        }

        let path = format!("/cart/items/{item_id}");
        let form = [("quantity", quantity.to_string())];
        let status: Status = self
            .send_json(self.request(Method::PUT, &path).form(&form))
            .await?;
        status.check()
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        let path = format!("/cart/items/{item_id}");
        let status: Status = self.send_json(self.request(Method::DELETE, &path)).await?;
        status.check()
    }
}

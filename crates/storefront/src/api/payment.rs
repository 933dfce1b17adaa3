//! Payment endpoints (sandbox card processing).

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use furnistore_core::{OrderId, PaymentIntentId};

use super::wire::{DataEnvelope, WireConfirmation, WireIntent};
use super::{ApiClient, ApiError, PaymentService};
use crate::models::{PaymentConfirmation, PaymentIntent};

#[async_trait]
impl PaymentService for ApiClient {
    #[instrument(skip(self))]
    async fn create_intent(&self, order_id: OrderId) -> Result<PaymentIntent, ApiError> {
        let builder = self
            .request(Method::POST, "/payment/create-intent")
            .query(&[("orderId", order_id.as_i64())]);
        let envelope: DataEnvelope<WireIntent> = self.send_json(builder).await?;
        envelope.status.check()?;
        envelope
            .data
            .map(PaymentIntent::from)
            .ok_or_else(|| ApiError::Parse("payment intent missing from response".to_string()))
    }

    #[instrument(skip(self), fields(intent_id = %intent_id))]
    async fn confirm_payment(
        &self,
        intent_id: &PaymentIntentId,
    ) -> Result<PaymentConfirmation, ApiError> {
        let form = [("paymentIntentId", intent_id.as_str())];
        let envelope: DataEnvelope<WireConfirmation> = self
            .send_json(self.request(Method::POST, "/payment/confirm").form(&form))
            .await?;
        envelope.status.check()?;
        envelope
            .data
            .map(|data| data.into_confirmation(intent_id))
            .ok_or_else(|| ApiError::Parse("payment status missing from response".to_string()))
    }
}

//! Order endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use furnistore_core::PaymentMethod;

use super::wire::{OrderEnvelope, OrdersEnvelope};
use super::{ApiClient, ApiError, OrderService};
use crate::models::{CheckoutForm, Order};

/// Form body of `POST /orders`.
///
/// Field names follow the backend, which mixes camelCase and snake_case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "shippingAddress")]
    pub shipping_address: String,
    #[serde(rename = "billingAddress")]
    pub billing_address: String,
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
    pub contact_phone: String,
    pub contact_email: String,
    pub contact_person: String,
}

impl From<&CheckoutForm> for CreateOrderRequest {
    fn from(form: &CheckoutForm) -> Self {
        Self {
            shipping_address: form.shipping_address.trim().to_string(),
            billing_address: form.billing_address_or_shipping().trim().to_string(),
            payment_method: form.payment_method,
            contact_phone: form.phone.trim().to_string(),
            contact_email: form.email.trim().to_string(),
            contact_person: form.contact_person.trim().to_string(),
        }
    }
}

#[async_trait]
impl OrderService for ApiClient {
    #[instrument(skip(self, request), fields(payment_method = %request.payment_method))]
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
        let envelope: OrderEnvelope = self
            .send_json(self.request(Method::POST, "/orders").form(request))
            .await?;
        envelope.status.check()?;
        let order = envelope
            .order
            .ok_or_else(|| ApiError::Parse("order missing from response".to_string()))?;
        Order::try_from(order)
    }
}

impl ApiClient {
    /// Fetch the signed-in user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the backend rejects it, or an
    /// order has an unrecognized shape.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let envelope: OrdersEnvelope = self.send_json(self.request(Method::GET, "/orders")).await?;
        envelope.status.check()?;
        let mut orders = envelope
            .orders
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }
}

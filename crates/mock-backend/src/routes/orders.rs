//! Order route handlers.

use axum::{Form, Json, extract::State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use furnistore_core::PaymentMethod;

use crate::auth::RequireAuth;
use crate::error::{MockError, Result};
use crate::state::{AppState, Fault, OrderDetails};

/// Form body of `POST /orders`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderForm {
    #[serde(rename = "shippingAddress", default)]
    pub shipping_address: String,
    #[serde(rename = "billingAddress", default)]
    pub billing_address: String,
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_person: String,
}

/// Create a pending order from the cart and empty the cart.
#[instrument(skip(state, _auth, form), fields(payment_method = %form.payment_method))]
pub async fn create(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Form(form): Form<CreateOrderForm>,
) -> Result<Json<Value>> {
    if state.faults().take(Fault::OrderCreation) {
        return Err(MockError::Injected("Order service unavailable"));
    }
    if form.shipping_address.trim().is_empty() {
        return Err(MockError::BadRequest(
            "Shipping address is required".to_string(),
        ));
    }

    // An empty cart still produces a (zero-total) order.
    let mut store = state.store().await;
    let billing_address = if form.billing_address.trim().is_empty() {
        form.shipping_address.clone()
    } else {
        form.billing_address
    };
    let order = store.create_order(
        OrderDetails {
            shipping_address: form.shipping_address,
            billing_address,
            payment_method: form.payment_method,
            contact_phone: form.contact_phone,
            contact_email: form.contact_email,
            contact_person: form.contact_person,
        },
        Utc::now(),
    );

    tracing::info!(order_id = %order.id, total = %order.total, "Order created");
    Ok(Json(json!({ "success": true, "order": order })))
}

/// List every order.
#[instrument(skip(state, _auth))]
pub async fn index(State(state): State<AppState>, _auth: RequireAuth) -> Json<Value> {
    let store = state.store().await;
    Json(json!({ "success": true, "orders": store.orders() }))
}

//! Payment route handlers.

use axum::{
    Form, Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use furnistore_core::OrderId;

use crate::auth::RequireAuth;
use crate::error::{MockError, Result};
use crate::state::{AppState, Fault};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentQuery {
    pub order_id: OrderId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmForm {
    pub payment_intent_id: String,
}

/// Open a payment intent for an order.
#[instrument(skip(state, _auth))]
pub async fn create_intent(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Query(query): Query<CreateIntentQuery>,
) -> Result<Json<Value>> {
    if state.faults().take(Fault::HangIntent) {
        tracing::warn!(order_id = %query.order_id, "Holding create-intent request open");
        std::future::pending::<()>().await;
    }
    if state.faults().take(Fault::IntentCreation) {
        return Err(MockError::Injected("Payment service unavailable"));
    }

    let (intent_id, client_secret) = state
        .store()
        .await
        .create_intent(query.order_id, Utc::now())?;

    tracing::info!(order_id = %query.order_id, %intent_id, "Payment intent created");
    Ok(Json(json!({
        "success": true,
        "data": { "paymentIntentId": intent_id, "clientSecret": client_secret },
    })))
}

/// Confirm a payment intent.
#[instrument(skip(state, _auth, form), fields(intent_id = %form.payment_intent_id))]
pub async fn confirm(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Form(form): Form<ConfirmForm>,
) -> Result<Json<Value>> {
    if state.faults().take(Fault::Confirmation) {
        return Err(MockError::Injected("Payment confirmation failed"));
    }
    let decline = state.faults().take(Fault::DeclinePayment);

    let status = state
        .store()
        .await
        .confirm_intent(&form.payment_intent_id, decline)?;

    tracing::info!(%status, "Payment confirmed");
    Ok(Json(json!({
        "success": true,
        "data": { "paymentIntentId": form.payment_intent_id, "status": status },
    })))
}

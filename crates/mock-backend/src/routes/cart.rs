//! Cart route handlers.

use axum::{
    Form, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use furnistore_core::{CartItemId, ProductId};

use crate::auth::RequireAuth;
use crate::error::Result;
use crate::state::AppState;

/// Form body of `POST /cart/items`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemForm {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Form body of `PUT /cart/items/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemForm {
    pub quantity: u32,
}

/// Return the cart.
#[instrument(skip(state, _auth))]
pub async fn show(State(state): State<AppState>, _auth: RequireAuth) -> Json<Value> {
    let store = state.store().await;
    Json(json!({ "success": true, "cart": { "items": store.cart() } }))
}

/// Add a product to the cart.
#[instrument(skip(state, _auth))]
pub async fn add(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Form(form): Form<AddItemForm>,
) -> Result<Json<Value>> {
    state.store().await.add_item(form.product_id, form.quantity)?;
    tracing::info!(product_id = %form.product_id, quantity = form.quantity, "Added to cart");
    Ok(Json(json!({ "success": true })))
}

/// Set the quantity of a cart line.
#[instrument(skip(state, _auth))]
pub async fn update(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<i64>,
    Form(form): Form<UpdateItemForm>,
) -> Result<Json<Value>> {
    state
        .store()
        .await
        .update_item(CartItemId::new(id), form.quantity)?;
    Ok(Json(json!({ "success": true })))
}

/// Remove a cart line.
#[instrument(skip(state, _auth))]
pub async fn remove(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    state.store().await.remove_item(CartItemId::new(id))?;
    Ok(Json(json!({ "success": true })))
}

//! User route handlers.

use axum::{Form, Json, extract::State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::auth::{RequireAuth, issue_token};
use crate::error::{MockError, Result};
use crate::state::{AppState, DEMO_USER, DemoUser};

/// Form body of `POST /users/login`.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Exchange the demo credentials for a bearer token.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<Value>> {
    if form.username != DEMO_USER.username || form.password != DEMO_USER.password {
        tracing::info!("Login rejected");
        return Err(MockError::InvalidCredentials);
    }

    let token = issue_token(DEMO_USER.username, Utc::now());
    state.store().await.remember_token(token.clone());

    tracing::info!("Login succeeded");
    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": {
            "id": DEMO_USER.id,
            "username": DEMO_USER.username,
            "email": DEMO_USER.email,
        },
    })))
}

/// Signed-in user's profile.
#[instrument(skip(_auth))]
pub async fn profile(_auth: RequireAuth) -> Json<DemoUser> {
    Json(DEMO_USER)
}

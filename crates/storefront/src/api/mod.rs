//! HTTP access to the shop backend.
//!
//! [`ApiClient`] speaks the backend's form-encoded request / JSON-envelope
//! response protocol. The checkout orchestrator only sees it through the
//! [`CartStore`], [`OrderService`] and [`PaymentService`] traits so that tests
//! can substitute scripted collaborators.

mod account;
mod cart;
mod client;
mod orders;
mod payment;
mod products;
pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use furnistore_core::{CartItemId, OrderId, PaymentIntentId, ProductId};

use crate::models::{CartSnapshot, Order, PaymentConfirmation, PaymentIntent};

pub use account::LoginOutcome;
pub use client::ApiClient;
pub use orders::CreateOrderRequest;

/// Errors returned by backend calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, TLS, malformed HTTP).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered 401; the session is no longer valid.
    #[error("not authenticated")]
    Unauthorized,

    /// Any other non-2xx status.
    #[error("API error: {status} - {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// 2xx response whose envelope reported `success: false`.
    #[error("request rejected: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    /// Response body did not have an accepted shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No answer within the allotted time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// The explanation the server supplied, if any.
    ///
    /// Shown to the user in preference to a generic fallback message.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Rejected(message) => message.as_deref(),
            Self::Http(_) | Self::Unauthorized | Self::Parse(_) | Self::Timeout(_) => None,
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// The server-side cart.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fetch the current cart.
    async fn fetch_cart(&self) -> Result<CartSnapshot, ApiError>;

    /// Add units of a product; the server merges them into an existing line.
    async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError>;

    /// Set the quantity of a line. Zero is rejected without a request.
    async fn update_item(&self, item_id: CartItemId, quantity: u32) -> Result<(), ApiError>;

    /// Remove a line.
    async fn remove_item(&self, item_id: CartItemId) -> Result<(), ApiError>;
}

/// Order creation.
///
/// Creating an order empties the server-side cart.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError>;
}

/// Card payment for an existing order.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Open a payment intent for the order.
    async fn create_intent(&self, order_id: OrderId) -> Result<PaymentIntent, ApiError>;

    /// Confirm a previously created intent.
    async fn confirm_payment(
        &self,
        intent_id: &PaymentIntentId,
    ) -> Result<PaymentConfirmation, ApiError>;
}

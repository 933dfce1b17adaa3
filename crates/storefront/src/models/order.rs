//! Orders and payment intents as returned by the backend.

use chrono::NaiveDateTime;
use secrecy::SecretString;
use serde::Serialize;

use furnistore_core::{OrderId, OrderStatus, PaymentIntentId, PaymentStatus, Price};

use super::cart::CartLine;

/// A persisted order. Immutable once returned by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub items: Vec<CartLine>,
    pub total: Price,
    /// Creation time in the backend's local time, when reported.
    pub created_at: Option<NaiveDateTime>,
}

/// A payment intent issued for an order.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentIntent")
            .field("id", &self.id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Outcome of confirming a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentConfirmation {
    pub intent_id: PaymentIntentId,
    pub status: PaymentStatus,
}

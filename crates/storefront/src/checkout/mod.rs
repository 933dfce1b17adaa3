//! Checkout: turning the cart and a filled-in form into a paid order.

mod orchestrator;
mod phase;
mod ui;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Order, PaymentConfirmation};

pub use orchestrator::{CheckoutOptions, CheckoutOrchestrator, Collaborators};
pub use phase::CheckoutPhase;
pub use ui::{CheckoutUi, Notice, NoticeKind, Route};

/// Correlates the log lines and Sentry breadcrumbs of one `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// A fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of a committed checkout.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub attempt_id: AttemptId,
    pub order: Order,
    /// Present when the order was paid by card.
    pub payment: Option<PaymentConfirmation>,
}

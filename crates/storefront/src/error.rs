//! Checkout errors and Sentry integration helpers.
//!
//! [`CheckoutError`] is what a checkout attempt reports to its caller. Each
//! variant maps to exactly one user-facing message via
//! [`CheckoutError::user_message`], preferring whatever the server said.

use thiserror::Error;

use furnistore_core::OrderId;

use crate::api::ApiError;
use crate::config::Language;
use crate::messages::catalog;
use crate::models::ValidationError;

/// Which payment call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStage {
    CreatingIntent,
    Confirming,
}

impl std::fmt::Display for PaymentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::CreatingIntent => "creating payment intent",
            Self::Confirming => "confirming payment",
        })
    }
}

/// Why a checkout attempt did not commit.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required form field is blank. Nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// `submit` was called with no checkout form open.
    #[error("no checkout form is open")]
    NotOpen,

    /// The displayed cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// Another attempt is still in flight.
    #[error("a checkout attempt is already in progress")]
    Busy,

    /// The backend rejected the session; the user must sign in again.
    #[error("not authenticated")]
    Auth,

    /// Order creation failed; nothing was persisted.
    #[error("order creation failed: {0}")]
    OrderCreation(#[source] ApiError),

    /// Adding, changing or removing a cart line failed.
    #[error("cart update failed: {0}")]
    CartUpdate(#[source] ApiError),

    /// The order exists but could not be paid for.
    #[error("payment failed for order {order_id} while {stage}: {source}")]
    Payment {
        order_id: OrderId,
        stage: PaymentStage,
        #[source]
        source: ApiError,
    },
}

impl CheckoutError {
    /// The message to show the user.
    #[must_use]
    pub fn user_message(&self, language: Language) -> String {
        let messages = catalog(language);
        match self {
            Self::Validation(err) => messages.field_required(err.field()),
            Self::NotOpen => messages.not_open.to_string(),
            Self::EmptyCart => messages.empty_cart.to_string(),
            Self::Busy => messages.busy.to_string(),
            Self::Auth => messages.login_required.to_string(),
            Self::OrderCreation(err) => err
                .server_message()
                .unwrap_or(messages.order_failed)
                .to_string(),
            Self::CartUpdate(err) => err
                .server_message()
                .unwrap_or(messages.cart_update_failed)
                .to_string(),
            Self::Payment { stage, source, .. } => {
                let fallback = match stage {
                    PaymentStage::CreatingIntent => messages.intent_failed,
                    PaymentStage::Confirming => messages.confirm_failed,
                };
                source.server_message().unwrap_or(fallback).to_string()
            }
        }
    }

    /// Id of an order that was created but left unpaid.
    #[must_use]
    pub const fn orphaned_order(&self) -> Option<OrderId> {
        match self {
            Self::Payment { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }
}

// =============================================================================
// Sentry Helpers
// =============================================================================

/// Set the Sentry user context.
///
/// Call this after sign-in to associate errors with the user.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a checkout step.
///
/// Breadcrumbs appear in Sentry reports to show the trail of steps
/// leading up to a failure.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

/// Report an order that was created but never paid for.
///
/// The order stays `pending` on the server; this is the only trace of it
/// outside the backend.
pub fn report_orphaned_order(order_id: OrderId, error: &CheckoutError) -> sentry::types::Uuid {
    sentry::with_scope(
        |scope| {
            scope.set_tag("order_id", order_id);
            scope.set_extra("error", error.to_string().into());
        },
        || {
            sentry::capture_message(
                &format!("Order {order_id} created but payment failed"),
                sentry::Level::Warning,
            )
        },
    )
}

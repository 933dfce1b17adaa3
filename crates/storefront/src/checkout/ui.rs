//! Hooks through which checkout reaches the user.

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// A blocking, acknowledge-to-dismiss message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: message.into(),
        }
    }
}

/// Views checkout can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    OrderHistory,
    Login,
}

impl Route {
    /// Path of the view in the web storefront.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::OrderHistory => "/order-history",
            Self::Login => "/login",
        }
    }
}

/// Presentation layer driven by the orchestrator.
///
/// Implementations must not block; a terminal UI prints, a web UI queues.
pub trait CheckoutUi: Send + Sync {
    /// Show a notice. Called exactly once per finished attempt.
    fn notify(&self, notice: Notice);

    /// Move the user to another view.
    fn navigate(&self, route: Route);
}

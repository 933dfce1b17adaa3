//! Progress of a checkout attempt.

/// Where the current (or most recent) attempt is.
///
/// ```text
/// Idle -> Validating -> Idle                     (invalid form)
/// Validating -> CreatingOrder -> Failed          (cart intact)
/// CreatingOrder -> CreatingIntent -> Failed      (cart restored)
/// CreatingIntent -> ConfirmingPayment -> Failed  (cart restored)
/// CreatingOrder -> Committed                     (non-card payment)
/// ConfirmingPayment -> Committed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Validating,
    CreatingOrder,
    CreatingIntent,
    ConfirmingPayment,
    Committed,
    Failed {
        /// Whether the displayed cart was restored after an order was created.
        cart_restored: bool,
    },
}

impl CheckoutPhase {
    /// Whether the attempt has finished. A new attempt may start from here.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Failed { .. })
    }

    /// Whether a call is outstanding.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(
            self,
            Self::Validating | Self::CreatingOrder | Self::CreatingIntent | Self::ConfirmingPayment
        )
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Idle | Self::Committed | Self::Failed { .. }, Self::Validating)
            | (Self::Validating, Self::Idle | Self::CreatingOrder)
            | (Self::CreatingOrder, Self::CreatingIntent | Self::Committed)
            | (Self::CreatingIntent, Self::ConfirmingPayment)
            | (Self::ConfirmingPayment, Self::Committed) => true,
            // Order creation failures leave the cart untouched; later ones restore it.
            (Self::CreatingOrder, Self::Failed { cart_restored }) => !cart_restored,
            (Self::CreatingIntent | Self::ConfirmingPayment, Self::Failed { cart_restored }) => {
                cart_restored
            }
            // Closing the form resets a finished attempt.
            (Self::Committed | Self::Failed { .. }, Self::Idle) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::CreatingOrder => "creating order",
            Self::CreatingIntent => "creating payment intent",
            Self::ConfirmingPayment => "confirming payment",
            Self::Committed => "committed",
            Self::Failed { .. } => "failed",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::CheckoutPhase::*;
    use super::*;

    #[test]
    fn test_card_path() {
        let path = [
            Idle,
            Validating,
            CreatingOrder,
            CreatingIntent,
            ConfirmingPayment,
            Committed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_non_card_path_skips_payment() {
        assert!(CreatingOrder.can_transition_to(Committed));
        assert!(!CreatingOrder.can_transition_to(ConfirmingPayment));
    }

    #[test]
    fn test_failure_restoration_rules() {
        assert!(CreatingOrder.can_transition_to(Failed { cart_restored: false }));
        assert!(!CreatingOrder.can_transition_to(Failed { cart_restored: true }));
        assert!(CreatingIntent.can_transition_to(Failed { cart_restored: true }));
        assert!(!ConfirmingPayment.can_transition_to(Failed { cart_restored: false }));
    }

    #[test]
    fn test_terminal_phases_allow_retry() {
        let failed = Failed { cart_restored: true };
        assert!(failed.is_terminal());
        assert!(Committed.is_terminal());
        assert!(!CreatingIntent.is_terminal());
        assert!(failed.can_transition_to(Validating));
        assert!(!Committed.can_transition_to(CreatingOrder));
        assert!(!Idle.can_transition_to(Committed));
    }

    #[test]
    fn test_in_flight() {
        assert!(CreatingOrder.is_in_flight());
        assert!(!Idle.is_in_flight());
        assert!(!Committed.is_in_flight());
    }
}

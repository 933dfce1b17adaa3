//! Cart line items as displayed to the user.

use serde::{Deserialize, Serialize};

use furnistore_core::{CartItemId, CurrencyCode, Price, ProductId};

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Backend id of the cart line (used for quantity updates and removal).
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
    /// English product name.
    pub display_name: String,
    /// Chinese product name, when the backend supplies one.
    pub display_name_zh: Option<String>,
    /// Image path relative to the backend's static root.
    pub image_ref: Option<String>,
}

impl CartLine {
    /// `unit_price × quantity`, or `None` if it overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.unit_price.checked_times(self.quantity)
    }
}

/// Ordered snapshot of the cart.
///
/// The backend owns the authoritative cart. A snapshot is the local copy used
/// for display and for restoring the display after a failed checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    /// Create a snapshot from lines, preserving their order.
    #[must_use]
    pub const fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self { lines: Vec::new() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity))
    }

    /// Sum of all line totals, rounded to two decimal places.
    ///
    /// An empty cart totals zero in the default currency. Returns `None` if
    /// the amounts overflow.
    #[must_use]
    pub fn total(&self) -> Option<Price> {
        let currency = self
            .lines
            .first()
            .map_or_else(CurrencyCode::default, |line| line.unit_price.currency_code);
        self.lines
            .iter()
            .try_fold(Price::zero(currency), |acc, line| {
                acc.checked_add(line.line_total()?)
            })
            .map(Price::rounded)
    }

    /// Find a line by its backend id.
    #[must_use]
    pub fn line(&self, item_id: CartItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.item_id == item_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn line(id: i64, name: &str, price: &str, quantity: u32) -> CartLine {
        CartLine {
            item_id: CartItemId::new(id),
            product_id: ProductId::new(id),
            quantity,
            unit_price: Price::parse(price, CurrencyCode::HKD).unwrap(),
            display_name: name.to_string(),
            display_name_zh: None,
            image_ref: None,
        }
    }

    /// The two-item cart used throughout the checkout tests.
    pub(crate) fn sofa_and_table() -> CartSnapshot {
        CartSnapshot::new(vec![
            line(1, "Modern Sofa", "899.99", 2),
            line(2, "Dining Table", "599.99", 1),
        ])
    }

    #[test]
    fn test_total_of_sofa_and_table() {
        let cart = sofa_and_table();
        assert_eq!(cart.total().unwrap().to_string(), "$2399.97");
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_empty_cart_totals_zero() {
        let cart = CartSnapshot::empty();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Some(Price::zero(CurrencyCode::HKD)));
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_overflowing_total_is_none() {
        let cart = CartSnapshot::new(vec![
            line(1, "Gold Sofa", "79228162514264337593543950335", 2),
            line(2, "Stool", "1", u32::MAX),
        ]);
        assert_eq!(cart.lines[0].line_total(), None);
        assert_eq!(cart.total(), None);
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn test_line_lookup() {
        let cart = sofa_and_table();
        assert_eq!(
            cart.line(CartItemId::new(2)).map(|l| l.display_name.as_str()),
            Some("Dining Table")
        );
        assert!(cart.line(CartItemId::new(99)).is_none());
    }
}

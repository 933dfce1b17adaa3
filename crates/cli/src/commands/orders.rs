//! Order history command.

#![allow(clippy::print_stdout)]

use super::{CliError, Shop};

/// Print past orders, newest first.
///
/// # Errors
///
/// Returns `CliError` if not signed in or the orders cannot be fetched.
pub async fn list(shop: &Shop) -> Result<(), CliError> {
    shop.require_session()?;
    let orders = shop.client.list_orders().await?;

    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for order in orders {
        let placed = order
            .created_at
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "Order {:<6} {:<16} {:<11} {:>10}  ({} line(s))",
            order.id,
            placed,
            order.status.as_str(),
            order.total.to_string(),
            order.items.len()
        );
    }
    Ok(())
}

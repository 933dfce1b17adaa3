//! Cart commands.

#![allow(clippy::print_stdout)]

use furnistore_core::{CartItemId, Price, ProductId};
use furnistore_storefront::Language;
use furnistore_storefront::models::{CartLine, CartSnapshot};

use super::{CliError, Shop};

/// Print the cart.
///
/// # Errors
///
/// Returns `CliError` if not signed in or the cart cannot be fetched.
pub async fn show(shop: &Shop) -> Result<(), CliError> {
    shop.require_session()?;
    let cart = shop.orchestrator.load_cart().await?;
    print_cart(&cart, shop.config.language);
    Ok(())
}

/// Add a product and print the updated cart.
///
/// # Errors
///
/// Returns `CliError` if not signed in or the backend rejects the change.
pub async fn add(shop: &Shop, product_id: ProductId, quantity: u32) -> Result<(), CliError> {
    shop.require_session()?;
    let cart = shop.orchestrator.add_to_cart(product_id, quantity).await?;
    print_cart(&cart, shop.config.language);
    Ok(())
}

/// Change a line's quantity (at least 1) and print the updated cart.
///
/// # Errors
///
/// Returns `CliError` if not signed in or the backend rejects the change.
pub async fn update(shop: &Shop, item_id: CartItemId, quantity: u32) -> Result<(), CliError> {
    shop.require_session()?;
    let cart = shop.orchestrator.update_cart_item(item_id, quantity).await?;
    print_cart(&cart, shop.config.language);
    Ok(())
}

/// Remove a line and print the updated cart.
///
/// # Errors
///
/// Returns `CliError` if not signed in or the backend rejects the change.
pub async fn remove(shop: &Shop, item_id: CartItemId) -> Result<(), CliError> {
    shop.require_session()?;
    let cart = shop.orchestrator.remove_cart_item(item_id).await?;
    print_cart(&cart, shop.config.language);
    Ok(())
}

/// Name to show for a line in the given language.
fn line_name(line: &CartLine, language: Language) -> &str {
    match (language, line.display_name_zh.as_deref()) {
        (Language::ZhHant, Some(zh)) if !zh.is_empty() => zh,
        _ => &line.display_name,
    }
}

pub(crate) fn print_cart(cart: &CartSnapshot, language: Language) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in &cart.lines {
        println!(
            "#{:<4} {:<28} {:>3} x {:>10} = {:>10}",
            line.item_id,
            line_name(line, language),
            line.quantity,
            line.unit_price.to_string(),
            amount(line.line_total()),
        );
    }
    println!("{} item(s), total {}", cart.item_count(), amount(cart.total()));
}

fn amount(price: Option<Price>) -> String {
    price.map_or_else(|| "n/a".to_string(), |p| p.to_string())
}

//! Catalog commands.

#![allow(clippy::print_stdout)]

use furnistore_core::ProductId;
use furnistore_storefront::Language;
use furnistore_storefront::models::Product;

use super::{CliError, Shop};

/// Print the catalog with the ids `add` expects.
///
/// # Errors
///
/// Returns `CliError` if the catalog cannot be fetched.
pub async fn list(shop: &Shop) -> Result<(), CliError> {
    let products = shop.client.list_products(shop.config.language).await?;
    if products.is_empty() {
        println!("No products available.");
        return Ok(());
    }
    for product in &products {
        println!("{}", summary(product, shop.config.language));
    }
    Ok(())
}

/// Print one product.
///
/// # Errors
///
/// Returns `CliError` if the product is unknown or cannot be fetched.
pub async fn show(shop: &Shop, id: ProductId) -> Result<(), CliError> {
    let product = shop.client.fetch_product(id).await?;
    println!("{}", summary(&product, shop.config.language));
    if let Some(image) = &product.image_ref {
        println!("       image: {image}");
    }
    println!("       add with: furnistore add {}", product.id);
    Ok(())
}

fn summary(product: &Product, language: Language) -> String {
    let was = product
        .compare_price
        .filter(|_| product.is_on_sale())
        .map(|p| format!(" (was {p})"))
        .unwrap_or_default();
    format!(
        "#{:<4} {:<28} {:>10}{was}",
        product.id,
        product.display_name(language),
        product.price.to_string(),
    )
}

//! Catalog products.

use serde::{Deserialize, Serialize};

use furnistore_core::{Price, ProductId};

use crate::config::Language;

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// English name.
    pub name: String,
    pub name_zh: Option<String>,
    pub price: Price,
    /// Price before discount, when the product is on sale.
    pub compare_price: Option<Price>,
    /// First image path, relative to the backend's static root.
    pub image_ref: Option<String>,
}

impl Product {
    /// Name in `language`, falling back to English.
    #[must_use]
    pub fn display_name(&self, language: Language) -> &str {
        match (language, self.name_zh.as_deref()) {
            (Language::ZhHant, Some(zh)) if !zh.trim().is_empty() => zh,
            _ => &self.name,
        }
    }

    /// Whether the listing shows a higher former price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.compare_price
            .is_some_and(|compare| compare.amount > self.price.amount)
    }
}

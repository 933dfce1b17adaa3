//! Raw backend response shapes and their normalization.
//!
//! The backend is loosely typed: prices arrive as numbers or strings under
//! one of several field names, timestamps arrive as `LocalDateTime` arrays,
//! ISO strings, or epoch milliseconds. Every accepted shape is an explicit
//! variant here, and each is converted once into the canonical model types
//! in [`crate::models`]. Nothing outside this module sees a wire type.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use secrecy::SecretString;
use serde::Deserialize;

use furnistore_core::{
    CartItemId, CurrencyCode, OrderId, OrderStatus, PaymentIntentId, PaymentStatus, Price,
    ProductId,
};

use super::ApiError;
use crate::models::{
    CartLine, CartSnapshot, Order, PaymentConfirmation, PaymentIntent, Product, SessionUser,
};

// =============================================================================
// Scalar Shapes
// =============================================================================

/// A monetary amount: JSON number or decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireAmount {
    Number(f64),
    Text(String),
}

impl WireAmount {
    /// Convert to a [`Price`] in the shop currency.
    ///
    /// Numbers go through their shortest decimal representation, so `899.99`
    /// becomes exactly `899.99` rather than its binary approximation.
    pub fn to_price(&self) -> Result<Price, ApiError> {
        let text = match self {
            Self::Number(n) if n.is_finite() => n.to_string(),
            Self::Number(n) => return Err(ApiError::Parse(format!("invalid amount: {n}"))),
            Self::Text(s) => s.clone(),
        };
        Price::parse(&text, CurrencyCode::HKD).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// A numeric identifier: JSON number or numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    pub fn to_i64(&self) -> Result<i64, ApiError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ApiError::Parse(format!("invalid id: {s}"))),
        }
    }
}

/// A timestamp in any of the shapes the backend emits.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    /// Java `LocalDateTime`: `[year, month, day, hour?, minute?, second?, nanos?]`.
    Parts(Vec<i64>),
    /// ISO-8601, with or without an offset.
    Text(String),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
}

impl WireTimestamp {
    /// Normalize to a naive date-time. Offset-bearing inputs are converted to UTC.
    ///
    /// Returns `None` for shapes that do not describe a valid instant.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Parts(parts) => {
                let part = |i: usize, default: i64| parts.get(i).copied().unwrap_or(default);
                let date = NaiveDate::from_ymd_opt(
                    i32::try_from(part(0, -1)).ok()?,
                    u32::try_from(part(1, -1)).ok()?,
                    u32::try_from(part(2, -1)).ok()?,
                )?;
                date.and_hms_nano_opt(
                    u32::try_from(part(3, 0)).ok()?,
                    u32::try_from(part(4, 0)).ok()?,
                    u32::try_from(part(5, 0)).ok()?,
                    u32::try_from(part(6, 0)).ok()?,
                )
            }
            Self::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.naive_utc())
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok(),
            Self::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms).map(|dt| dt.naive_utc()),
        }
    }
}

// =============================================================================
// Field-Name Variants
// =============================================================================

/// Unit price of a line, under whichever field name the endpoint uses.
///
/// Variants are tried in order, so `productPrice` wins when several are present.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireLinePrice {
    Product {
        #[serde(rename = "productPrice")]
        product_price: WireAmount,
    },
    Unit {
        #[serde(rename = "unitPrice")]
        unit_price: WireAmount,
    },
    Plain {
        price: WireAmount,
    },
}

impl WireLinePrice {
    fn amount(&self) -> &WireAmount {
        match self {
            Self::Product { product_price } => product_price,
            Self::Unit { unit_price } => unit_price,
            Self::Plain { price } => price,
        }
    }
}

/// Order creation time, under whichever field name the endpoint uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireCreatedAt {
    CamelCase {
        #[serde(rename = "createdAt")]
        created_at: WireTimestamp,
    },
    OrderDate {
        #[serde(rename = "orderDate")]
        order_date: WireTimestamp,
    },
    SnakeCase {
        created_at: WireTimestamp,
    },
    Absent {},
}

impl WireCreatedAt {
    fn to_naive(&self) -> Option<NaiveDateTime> {
        match self {
            Self::CamelCase { created_at } | Self::SnakeCase { created_at } => {
                created_at.to_naive()
            }
            Self::OrderDate { order_date } => order_date.to_naive(),
            Self::Absent {} => None,
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A cart or order line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLine {
    /// Cart line id. Order lines may omit it.
    #[serde(default)]
    pub id: Option<WireId>,
    pub product_id: WireId,
    pub quantity: u32,
    #[serde(flatten)]
    pub price: WireLinePrice,
    #[serde(default, alias = "productName")]
    pub product_name_en: Option<String>,
    #[serde(default)]
    pub product_name_zh: Option<String>,
    #[serde(default)]
    pub product_image_url: Option<String>,
}

impl TryFrom<WireLine> for CartLine {
    type Error = ApiError;

    fn try_from(line: WireLine) -> Result<Self, Self::Error> {
        let product_id = line.product_id.to_i64()?;
        let item_id = match &line.id {
            Some(id) => id.to_i64()?,
            None => product_id,
        };
        Ok(Self {
            item_id: CartItemId::new(item_id),
            product_id: ProductId::new(product_id),
            quantity: line.quantity,
            unit_price: line.price.amount().to_price()?,
            display_name: line
                .product_name_en
                .unwrap_or_else(|| format!("Product {product_id}")),
            display_name_zh: line.product_name_zh,
            image_ref: line.product_image_url,
        })
    }
}

fn convert_lines(lines: Vec<WireLine>) -> Result<Vec<CartLine>, ApiError> {
    lines.into_iter().map(CartLine::try_from).collect()
}

/// `cart` object of `GET /cart`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireCart {
    #[serde(default)]
    pub items: Vec<WireLine>,
}

impl TryFrom<WireCart> for CartSnapshot {
    type Error = ApiError;

    fn try_from(cart: WireCart) -> Result<Self, Self::Error> {
        let snapshot = Self::new(convert_lines(cart.items)?);
        if snapshot.total().is_none() {
            return Err(ApiError::Parse("cart total out of range".to_string()));
        }
        Ok(snapshot)
    }
}

/// An order as returned by `POST /orders` and `GET /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireOrder {
    pub id: WireId,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub items: Vec<WireLine>,
    #[serde(default, alias = "totalAmount")]
    pub total: Option<WireAmount>,
    #[serde(flatten)]
    pub created: WireCreatedAt,
}

impl TryFrom<WireOrder> for Order {
    type Error = ApiError;

    fn try_from(order: WireOrder) -> Result<Self, Self::Error> {
        let created_at = order.created.to_naive();
        let items = convert_lines(order.items)?;
        let total = match &order.total {
            Some(amount) => amount.to_price()?.rounded(),
            None => CartSnapshot::new(items.clone())
                .total()
                .ok_or_else(|| ApiError::Parse("order total out of range".to_string()))?,
        };
        Ok(Self {
            id: OrderId::new(order.id.to_i64()?),
            status: order.status.unwrap_or_default(),
            items,
            total,
            created_at,
        })
    }
}

/// A catalog product from `GET /products` or `GET /products/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    pub id: WireId,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_zh: Option<String>,
    /// Untranslated name, used when `nameEn` is absent.
    #[serde(default)]
    pub name: Option<String>,
    pub price: WireAmount,
    #[serde(default)]
    pub compare_price: Option<WireAmount>,
    #[serde(default)]
    pub images: Vec<WireImage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireImage {
    pub image_url: String,
}

impl TryFrom<WireProduct> for Product {
    type Error = ApiError;

    fn try_from(product: WireProduct) -> Result<Self, Self::Error> {
        let id = product.id.to_i64()?;
        let name = product
            .name_en
            .or(product.name)
            .unwrap_or_else(|| format!("Product {id}"));
        Ok(Self {
            id: ProductId::new(id),
            name,
            name_zh: product.name_zh,
            price: product.price.to_price()?,
            compare_price: product
                .compare_price
                .as_ref()
                .map(WireAmount::to_price)
                .transpose()?,
            image_ref: product.images.into_iter().next().map(|image| image.image_url),
        })
    }
}

/// `data` object of `POST /payment/create-intent`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireIntent {
    pub payment_intent_id: String,
    pub client_secret: String,
}

impl From<WireIntent> for PaymentIntent {
    fn from(intent: WireIntent) -> Self {
        Self {
            id: PaymentIntentId::new(intent.payment_intent_id),
            client_secret: SecretString::from(intent.client_secret),
        }
    }
}

/// `data` object of `POST /payment/confirm`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireConfirmation {
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    pub status: PaymentStatus,
}

impl WireConfirmation {
    /// Attach the intent id, preferring the one the server echoed.
    pub fn into_confirmation(self, requested: &PaymentIntentId) -> PaymentConfirmation {
        PaymentConfirmation {
            intent_id: self
                .payment_intent_id
                .map_or_else(|| requested.clone(), PaymentIntentId::new),
            status: self.status,
        }
    }
}

// =============================================================================
// Envelopes
// =============================================================================

/// Fields every JSON envelope may carry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Status {
    /// `Ok` when the envelope reports success, otherwise the server's reason.
    pub fn check(&self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                self.error.clone().or_else(|| self.message.clone()),
            ))
        }
    }
}

/// `GET /cart`.
#[derive(Debug, Deserialize)]
pub struct CartEnvelope {
    #[serde(flatten)]
    pub status: Status,
    #[serde(default)]
    pub cart: Option<WireCart>,
}

/// `POST /orders`.
#[derive(Debug, Deserialize)]
pub struct OrderEnvelope {
    #[serde(flatten)]
    pub status: Status,
    #[serde(default)]
    pub order: Option<WireOrder>,
}

/// `GET /orders`.
#[derive(Debug, Deserialize)]
pub struct OrdersEnvelope {
    #[serde(flatten)]
    pub status: Status,
    #[serde(default)]
    pub orders: Vec<WireOrder>,
}

/// `GET /products`: a bare array, or an envelope around one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductsBody {
    Bare(Vec<WireProduct>),
    Wrapped {
        #[serde(flatten)]
        status: Status,
        #[serde(default)]
        products: Vec<WireProduct>,
    },
}

impl ProductsBody {
    /// The listed products, or the server's reason for refusing.
    pub fn into_products(self) -> Result<Vec<WireProduct>, ApiError> {
        match self {
            Self::Bare(products) => Ok(products),
            Self::Wrapped { status, products } => {
                status.check()?;
                Ok(products)
            }
        }
    }
}

/// `GET /products/{id}`: the product itself, or `{ product }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductBody {
    Bare(WireProduct),
    Wrapped { product: WireProduct },
}

impl ProductBody {
    pub fn into_product(self) -> WireProduct {
        match self {
            Self::Bare(product) | Self::Wrapped { product } => product,
        }
    }
}

/// `{ success, data }` envelope used by the payment endpoints.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(flatten)]
    pub status: Status,
    pub data: Option<T>,
}

/// `POST /users/login`.
#[derive(Debug, Deserialize)]
pub struct LoginEnvelope {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error body of a non-2xx response.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Server-supplied explanation, if the body carried one.
    pub fn parse(body: &str) -> Option<String> {
        serde_json::from_str::<Self>(body)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .filter(|m| !m.trim().is_empty())
    }
}

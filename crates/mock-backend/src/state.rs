//! In-memory shop data and fault switches.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use furnistore_core::{
    CartItemId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

use crate::config::MockBackendConfig;
use crate::error::MockError;

// =============================================================================
// Faults
// =============================================================================

/// A failure the backend can be told to produce once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Next `POST /orders` answers 500.
    OrderCreation,
    /// Next `POST /payment/create-intent` answers 500.
    IntentCreation,
    /// Next `POST /payment/confirm` answers 500.
    Confirmation,
    /// Next confirmation succeeds at HTTP level but reports `failed`.
    DeclinePayment,
    /// Next `POST /payment/create-intent` never answers.
    HangIntent,
    /// Next authenticated request answers 401.
    RejectAuth,
}

impl FromStr for Fault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(Self::OrderCreation),
            "intent" => Ok(Self::IntentCreation),
            "confirm" => Ok(Self::Confirmation),
            "decline" => Ok(Self::DeclinePayment),
            "hang" => Ok(Self::HangIntent),
            "auth" => Ok(Self::RejectAuth),
            _ => Err(format!("unknown fault: {s}")),
        }
    }
}

/// One-shot fault switches.
#[derive(Debug, Default)]
pub struct Faults {
    order: AtomicBool,
    intent: AtomicBool,
    confirm: AtomicBool,
    decline: AtomicBool,
    hang: AtomicBool,
    auth: AtomicBool,
}

impl Faults {
    const fn flag(&self, fault: Fault) -> &AtomicBool {
        match fault {
            Fault::OrderCreation => &self.order,
            Fault::IntentCreation => &self.intent,
            Fault::Confirmation => &self.confirm,
            Fault::DeclinePayment => &self.decline,
            Fault::HangIntent => &self.hang,
            Fault::RejectAuth => &self.auth,
        }
    }

    /// Make the next matching request fail.
    pub fn arm(&self, fault: Fault) {
        self.flag(fault).store(true, Ordering::SeqCst);
    }

    /// Consume the fault if armed.
    pub fn take(&self, fault: Fault) -> bool {
        self.flag(fault).swap(false, Ordering::SeqCst)
    }
}

// =============================================================================
// Data
// =============================================================================

/// A product that can be added to the cart.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name_en: &'static str,
    pub name_zh: &'static str,
    pub image_url: &'static str,
    pub price: Decimal,
}

/// A cart line, serialized the way the storefront backend sends it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name_en: String,
    pub product_name_zh: String,
    pub product_image_url: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Checkout details submitted with an order.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: PaymentMethod,
    pub contact_phone: String,
    pub contact_email: String,
    pub contact_person: String,
}

/// A persisted order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: PaymentMethod,
    pub contact_phone: String,
    pub contact_email: String,
    pub contact_person: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
}

/// A payment intent and the order it pays for.
#[derive(Debug, Clone)]
pub struct IntentRecord {
    pub order_id: OrderId,
    pub client_secret: String,
    pub status: PaymentStatus,
}

/// The single demo account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoUser {
    pub id: UserId,
    pub username: &'static str,
    #[serde(skip)]
    pub password: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
    pub address: &'static str,
}

pub const DEMO_USER: DemoUser = DemoUser {
    id: UserId::new(1),
    username: "demo",
    password: "password123",
    first_name: "Tai Man",
    last_name: "Chan",
    email: "demo@furnistore.hk",
    phone: "91234567",
    address: "1 Queen's Road Central, Hong Kong",
};

/// Everything the backend remembers.
#[derive(Debug)]
pub struct Store {
    products: Vec<Product>,
    cart: Vec<CartItem>,
    next_item_id: i64,
    orders: Vec<OrderRecord>,
    next_order_id: i64,
    intents: HashMap<String, IntentRecord>,
    tokens: HashSet<String>,
}

impl Default for Store {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Store {
    /// Catalog of three products with a sofa and a table in the cart.
    #[must_use]
    pub fn seeded() -> Self {
        let products = vec![
            Product {
                id: ProductId::new(1),
                name_en: "Modern Sofa",
                name_zh: "現代沙發",
                image_url: "/images/sofa1.jpg",
                price: Decimal::new(89_999, 2),
            },
            Product {
                id: ProductId::new(2),
                name_en: "Dining Table",
                name_zh: "餐桌",
                image_url: "/images/table1.jpg",
                price: Decimal::new(59_999, 2),
            },
            Product {
                id: ProductId::new(3),
                name_en: "Office Chair",
                name_zh: "辦公椅",
                image_url: "/images/chair1.jpg",
                price: Decimal::new(29_999, 2),
            },
        ];

        let mut store = Self {
            products,
            cart: Vec::new(),
            next_item_id: 1,
            orders: Vec::new(),
            next_order_id: 1000,
            intents: HashMap::new(),
            tokens: HashSet::new(),
        };
        // Product ids are known to exist.
        let _ = store.add_item(ProductId::new(1), 2);
        let _ = store.add_item(ProductId::new(2), 1);
        store
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    #[must_use]
    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<&OrderRecord> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Add units of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `MockError` if the product is unknown or the quantity is zero.
    pub fn add_item(&mut self, product_id: ProductId, quantity: u32) -> Result<(), MockError> {
        if quantity == 0 {
            return Err(MockError::BadRequest("Quantity must be at least 1".to_string()));
        }
        let product = self
            .products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or(MockError::NotFound("Product"))?;

        if let Some(line) = self.cart.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| MockError::BadRequest("Quantity too large".to_string()))?;
            return Ok(());
        }

        let item = CartItem {
            id: CartItemId::new(self.next_item_id),
            product_id,
            product_name_en: product.name_en.to_string(),
            product_name_zh: product.name_zh.to_string(),
            product_image_url: product.image_url.to_string(),
            quantity,
            price: product.price,
        };
        self.next_item_id += 1;
        self.cart.push(item);
        Ok(())
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `MockError` if the line is unknown or the quantity is zero.
    pub fn update_item(&mut self, item_id: CartItemId, quantity: u32) -> Result<(), MockError> {
        if quantity == 0 {
            return Err(MockError::BadRequest("Quantity must be at least 1".to_string()));
        }
        let line = self
            .cart
            .iter_mut()
            .find(|l| l.id == item_id)
            .ok_or(MockError::NotFound("Cart item"))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `MockError::NotFound` if the line is unknown.
    pub fn remove_item(&mut self, item_id: CartItemId) -> Result<(), MockError> {
        let before = self.cart.len();
        self.cart.retain(|l| l.id != item_id);
        if self.cart.len() == before {
            return Err(MockError::NotFound("Cart item"));
        }
        Ok(())
    }

    /// Turn the cart into a pending order and empty the cart.
    pub fn create_order(&mut self, details: OrderDetails, now: DateTime<Utc>) -> OrderRecord {
        let items = std::mem::take(&mut self.cart);
        let total = items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum();
        let order = OrderRecord {
            id: OrderId::new(self.next_order_id),
            user_id: DEMO_USER.id,
            items,
            shipping_address: details.shipping_address,
            billing_address: details.billing_address,
            payment_method: details.payment_method,
            contact_phone: details.contact_phone,
            contact_email: details.contact_email,
            contact_person: details.contact_person,
            status: OrderStatus::Pending,
            created_at: now,
            total,
        };
        self.next_order_id += 1;
        self.orders.push(order.clone());
        order
    }

    /// Open a payment intent for an existing order.
    ///
    /// # Errors
    ///
    /// Returns `MockError::NotFound` if the order is unknown.
    pub fn create_intent(
        &mut self,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<(String, String), MockError> {
        if self.order(order_id).is_none() {
            return Err(MockError::NotFound("Order"));
        }
        let intent_id = format!(
            "pi_test_{}_{:08x}",
            now.timestamp_millis(),
            rand::random::<u32>()
        );
        let client_secret = format!("{intent_id}_secret_{:016x}", rand::random::<u64>());
        self.intents.insert(
            intent_id.clone(),
            IntentRecord {
                order_id,
                client_secret: client_secret.clone(),
                status: PaymentStatus::RequiresAction,
            },
        );
        Ok((intent_id, client_secret))
    }

    /// Confirm an intent. A successful payment moves its order to `processing`.
    ///
    /// # Errors
    ///
    /// Returns `MockError::NotFound` if the intent is unknown.
    pub fn confirm_intent(
        &mut self,
        intent_id: &str,
        decline: bool,
    ) -> Result<PaymentStatus, MockError> {
        let intent = self
            .intents
            .get_mut(intent_id)
            .ok_or(MockError::NotFound("Payment intent"))?;
        intent.status = if decline {
            PaymentStatus::Failed
        } else {
            PaymentStatus::Succeeded
        };
        let status = intent.status.clone();
        let order_id = intent.order_id;

        if status.is_success()
            && let Some(order) = self.orders.iter_mut().find(|o| o.id == order_id)
        {
            order.status = OrderStatus::Processing;
        }
        Ok(status)
    }

    pub fn remember_token(&mut self, token: String) {
        self.tokens.insert(token);
    }

    #[must_use]
    pub fn knows_token(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Mutex<Store>,
    faults: Faults,
    static_token: Option<SecretString>,
}

impl AppState {
    /// Create state with the seeded store and the configured faults armed.
    #[must_use]
    pub fn new(config: &MockBackendConfig) -> Self {
        let faults = Faults::default();
        for fault in &config.faults {
            faults.arm(*fault);
        }
        Self {
            inner: Arc::new(AppStateInner {
                store: Mutex::new(Store::seeded()),
                faults,
                static_token: config.token.clone(),
            }),
        }
    }

    /// Lock the store.
    pub async fn store(&self) -> MutexGuard<'_, Store> {
        self.inner.store.lock().await
    }

    #[must_use]
    pub fn faults(&self) -> &Faults {
        &self.inner.faults
    }

    /// Whether `token` was issued by login or is the configured static token.
    pub async fn accepts_token(&self, token: &str) -> bool {
        if self
            .inner
            .static_token
            .as_ref()
            .is_some_and(|t| t.expose_secret() == token)
        {
            return true;
        }
        self.store().await.knows_token(token)
    }
}

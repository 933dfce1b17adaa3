//! Domain models for the storefront client.
//!
//! These are the canonical shapes the rest of the crate works with. Raw
//! backend responses are normalized into them in [`crate::api::wire`].

pub mod cart;
pub mod checkout;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{CartLine, CartSnapshot};
pub use checkout::{CardFields, CheckoutForm, FormField, TestCard, ValidationError};
pub use order::{Order, PaymentConfirmation, PaymentIntent};
pub use product::Product;
pub use user::{SessionUser, UserProfile};

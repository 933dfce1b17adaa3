//! Furnistore storefront client library.
//!
//! Talks to the shop backend and runs checkout:
//!
//! - [`api`]: HTTP client and the collaborator traits checkout depends on
//! - [`checkout`]: the checkout orchestrator and its progress phases
//! - [`state`]: observable cart display and authentication session
//! - [`models`]: canonical cart, form, order and user types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod messages;
pub mod models;
pub mod state;

pub use api::{ApiClient, ApiError};
pub use checkout::{CheckoutOrchestrator, Receipt};
pub use config::{Language, StorefrontConfig};
pub use error::CheckoutError;

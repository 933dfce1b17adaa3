//! Furnistore Core - Shared types library.
//!
//! This crate provides common types used across all Furnistore components:
//! - `storefront` - Backend API client and checkout orchestration
//! - `mock-backend` - Local implementation of the shop backend
//! - `cli` - Terminal front end for browsing the cart and checking out
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be shared by the client and the mock
//! backend alike.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

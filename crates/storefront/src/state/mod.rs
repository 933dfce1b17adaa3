//! Observable client-side state.
//!
//! Each store is a `tokio::sync::watch` channel behind a cheap clonable
//! handle: readers get the latest value, writers replace it, and UIs
//! subscribe to re-render on change.

pub mod cart;
pub mod session;

pub use cart::CartRepository;
pub use session::{Session, SessionError, SessionStore};

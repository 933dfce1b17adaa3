//! Local copy of the cart shown to the user.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::CartSnapshot;

/// Observable holder of the displayed cart.
///
/// The backend owns the real cart; this is what the user currently sees.
/// Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct CartRepository {
    tx: Arc<watch::Sender<CartSnapshot>>,
}

impl Default for CartRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl CartRepository {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CartSnapshot::empty());
        Self { tx: Arc::new(tx) }
    }

    /// The current snapshot.
    #[must_use]
    pub fn get(&self) -> CartSnapshot {
        self.tx.borrow().clone()
    }

    /// Replace the displayed cart wholesale.
    pub fn set(&self, snapshot: CartSnapshot) {
        self.tx.send_replace(snapshot);
    }

    /// Show an empty cart.
    pub fn clear(&self) {
        self.tx.send_replace(CartSnapshot::empty());
    }

    /// Watch for changes to the displayed cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.tx.subscribe()
    }
}

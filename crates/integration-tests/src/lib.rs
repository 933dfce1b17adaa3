//! End-to-end test harness for Furnistore.
//!
//! Each [`TestContext`] starts its own mock backend on an ephemeral port and
//! wires a real [`ApiClient`] and [`CheckoutOrchestrator`] to it, so tests
//! exercise the HTTP boundary without any external services.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p furnistore-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use furnistore_mock_backend::{MockBackendConfig, MockServer};
use furnistore_storefront::api::LoginOutcome;
use furnistore_storefront::checkout::{
    CheckoutOptions, CheckoutUi, Collaborators, Notice, Route,
};
use furnistore_storefront::models::UserProfile;
use furnistore_storefront::state::{CartRepository, SessionStore};
use furnistore_storefront::{ApiClient, CheckoutOrchestrator, Language, StorefrontConfig};
use secrecy::SecretString;

pub use furnistore_mock_backend::Fault;

/// Demo account seeded in the mock backend.
pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "password123";

/// Records everything the orchestrator shows the user.
#[derive(Default)]
pub struct RecordingUi {
    notices: Mutex<Vec<Notice>>,
    routes: Mutex<Vec<Route>>,
}

impl RecordingUi {
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CheckoutUi for RecordingUi {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }

    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}

/// A mock backend plus a signed-in client stack pointed at it.
pub struct TestContext {
    pub server: MockServer,
    pub client: ApiClient,
    pub session: SessionStore,
    pub cart: CartRepository,
    pub ui: Arc<RecordingUi>,
    pub orchestrator: Arc<CheckoutOrchestrator>,
}

impl TestContext {
    /// Signed-in context with the default per-call timeout.
    ///
    /// # Panics
    ///
    /// Panics if the backend cannot start or the demo login fails.
    pub async fn new() -> Self {
        Self::with_call_timeout(Duration::from_secs(15)).await
    }

    /// Signed-in context with a custom per-call timeout.
    ///
    /// # Panics
    ///
    /// Panics if the backend cannot start or the demo login fails.
    pub async fn with_call_timeout(call_timeout: Duration) -> Self {
        let ctx = Self::signed_out(call_timeout).await;
        let outcome = ctx
            .client
            .login(DEMO_USERNAME, &SecretString::from(DEMO_PASSWORD))
            .await
            .expect("login request failed");
        assert!(
            matches!(outcome, LoginOutcome::SignedIn(_)),
            "demo login rejected: {outcome:?}"
        );
        ctx
    }

    /// Context with no session.
    ///
    /// # Panics
    ///
    /// Panics if the backend cannot start.
    pub async fn signed_out(call_timeout: Duration) -> Self {
        let server = MockServer::spawn(&MockBackendConfig {
            port: 0,
            ..MockBackendConfig::default()
        })
        .await
        .expect("failed to start mock backend");

        let config = StorefrontConfig {
            call_timeout,
            language: Language::En,
            ..StorefrontConfig::for_api_url(&server.api_url()).expect("mock backend URL is valid")
        };
        let session = SessionStore::new();
        let client = ApiClient::new(&config, session.clone()).expect("failed to build client");
        let cart = CartRepository::new();
        let ui = Arc::new(RecordingUi::default());
        let orchestrator = Arc::new(CheckoutOrchestrator::new(
            Collaborators::from_client(&client),
            cart.clone(),
            session.clone(),
            ui.clone(),
            CheckoutOptions::from(&config),
        ));

        Self {
            server,
            client,
            session,
            cart,
            ui,
            orchestrator,
        }
    }

    /// Arm a one-shot failure in the backend.
    pub fn arm(&self, fault: Fault) {
        self.server.state().faults().arm(fault);
    }

    /// Load the cart and open checkout pre-filled from the profile, paying
    /// with the sandbox test card.
    ///
    /// # Panics
    ///
    /// Panics if the cart or profile cannot be loaded.
    pub async fn open_card_checkout(&self) -> UserProfile {
        self.orchestrator
            .load_cart()
            .await
            .expect("failed to load cart");
        let profile = self
            .client
            .fetch_profile()
            .await
            .expect("failed to load profile");
        assert!(
            self.orchestrator.open_checkout(Some(&profile)),
            "checkout already in progress"
        );
        self.orchestrator.update_form(|form| form.fill_test_card());
        profile
    }
}

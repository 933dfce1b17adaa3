//! Drives one checkout attempt at a time from form to confirmed order.
//!
//! An attempt creates the order, pays for it when paying by card, and only
//! then clears the displayed cart. If payment fails after the order exists,
//! the displayed cart is put back exactly as it was and the order is left
//! `pending` on the server.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span, warn};

use furnistore_core::{CartItemId, ProductId};

use super::phase::CheckoutPhase;
use super::ui::{CheckoutUi, Notice, Route};
use super::{AttemptId, Receipt};
use crate::api::{ApiClient, ApiError, CartStore, CreateOrderRequest, OrderService, PaymentService};
use crate::config::{Language, StorefrontConfig};
use crate::error::{CheckoutError, PaymentStage, add_breadcrumb, report_orphaned_order};
use crate::messages::catalog;
use crate::models::{CartSnapshot, CheckoutForm, Order, PaymentConfirmation, UserProfile};
use crate::state::{CartRepository, SessionStore};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Remote services an attempt talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub cart: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderService>,
    pub payments: Arc<dyn PaymentService>,
}

impl Collaborators {
    /// All three services backed by the same API client.
    #[must_use]
    pub fn from_client(client: &ApiClient) -> Self {
        let client = Arc::new(client.clone());
        Self {
            cart: client.clone(),
            orders: client.clone(),
            payments: client,
        }
    }
}

/// Tunables for the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutOptions {
    /// Language of user-facing fallback messages.
    pub language: Language,
    /// Upper bound on each remote call.
    pub call_timeout: Duration,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            language: Language::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl From<&StorefrontConfig> for CheckoutOptions {
    fn from(config: &StorefrontConfig) -> Self {
        Self {
            language: config.language,
            call_timeout: config.call_timeout,
        }
    }
}

/// Holds the busy flag for the lifetime of one attempt.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Checkout orchestrator.
///
/// Share it behind an `Arc`; at most one [`submit`](Self::submit) runs at a time.
pub struct CheckoutOrchestrator {
    services: Collaborators,
    cart: CartRepository,
    session: SessionStore,
    ui: Arc<dyn CheckoutUi>,
    options: CheckoutOptions,
    busy: AtomicBool,
    form: watch::Sender<Option<CheckoutForm>>,
    phase: watch::Sender<CheckoutPhase>,
}

impl CheckoutOrchestrator {
    #[must_use]
    pub fn new(
        services: Collaborators,
        cart: CartRepository,
        session: SessionStore,
        ui: Arc<dyn CheckoutUi>,
        options: CheckoutOptions,
    ) -> Self {
        Self {
            services,
            cart,
            session,
            ui,
            options,
            busy: AtomicBool::new(false),
            form: watch::channel(None).0,
            phase: watch::channel(CheckoutPhase::Idle).0,
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Refresh the displayed cart from the server.
    ///
    /// Any failure other than an expired session shows an empty cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Auth`] if the backend rejected the session.
    pub async fn load_cart(&self) -> Result<CartSnapshot, CheckoutError> {
        match self.bounded(self.services.cart.fetch_cart()).await {
            Ok(snapshot) => {
                debug!(lines = snapshot.lines.len(), "Cart loaded");
                self.cart.set(snapshot.clone());
                Ok(snapshot)
            }
            Err(ApiError::Unauthorized) => {
                self.cart.clear();
                Err(self.fail(CheckoutError::Auth))
            }
            Err(err) => {
                warn!(error = %err, "Failed to load cart, showing it empty");
                self.cart.clear();
                Ok(CartSnapshot::empty())
            }
        }
    }

    /// Add a product to the cart and refresh the display.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Busy`] during an attempt, otherwise see
    /// [`Self::edit_cart`].
    pub async fn add_to_cart(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, CheckoutError> {
        self.edit_cart(self.services.cart.add_item(product_id, quantity.max(1)))
            .await
    }

    /// Change a line's quantity, clamped to at least 1, and refresh the display.
    ///
    /// # Errors
    ///
    /// See [`Self::add_to_cart`].
    pub async fn update_cart_item(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartSnapshot, CheckoutError> {
        self.edit_cart(self.services.cart.update_item(item_id, quantity.max(1)))
            .await
    }

    /// Remove a line and refresh the display.
    ///
    /// # Errors
    ///
    /// See [`Self::add_to_cart`].
    pub async fn remove_cart_item(&self, item_id: CartItemId) -> Result<CartSnapshot, CheckoutError> {
        self.edit_cart(self.services.cart.remove_item(item_id)).await
    }

    /// Run a cart edit, then reload the cart so the display mirrors the server.
    ///
    /// The display is left alone when the edit fails.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Auth`] if the session was rejected and
    /// [`CheckoutError::CartUpdate`] for any other failure; both are notified.
    async fn edit_cart(
        &self,
        edit: impl Future<Output = Result<(), ApiError>>,
    ) -> Result<CartSnapshot, CheckoutError> {
        if self.is_busy() {
            debug!("Cart edit ignored while checkout is in progress");
            return Err(CheckoutError::Busy);
        }
        match self.bounded(edit).await {
            Ok(()) => self.load_cart().await,
            Err(ApiError::Unauthorized) => Err(self.fail(CheckoutError::Auth)),
            Err(err) => {
                warn!(error = %err, "Cart update failed");
                Err(self.fail(CheckoutError::CartUpdate(err)))
            }
        }
    }

    // =========================================================================
    // Form
    // =========================================================================

    /// Open the checkout form, pre-filled from the profile when given.
    ///
    /// Returns `false`, leaving the current form alone, while an attempt is
    /// in flight.
    #[must_use]
    pub fn open_checkout(&self, profile: Option<&UserProfile>) -> bool {
        if self.is_busy() {
            return false;
        }
        self.form
            .send_replace(Some(CheckoutForm::prefilled(profile)));
        self.reset_finished_phase();
        true
    }

    /// Edit the open form. Returns `false` if no form is open.
    pub fn update_form(&self, edit: impl FnOnce(&mut CheckoutForm)) -> bool {
        self.form.send_if_modified(|form| {
            form.as_mut().is_some_and(|form| {
                edit(form);
                true
            })
        })
    }

    /// Close the form without submitting.
    ///
    /// Returns `false`, leaving the form open, while an attempt is in flight.
    pub fn cancel_checkout(&self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.form.send_replace(None);
        self.reset_finished_phase();
        true
    }

    /// The open form, if any.
    #[must_use]
    pub fn form(&self) -> Option<CheckoutForm> {
        self.form.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_form(&self) -> watch::Receiver<Option<CheckoutForm>> {
        self.form.subscribe()
    }

    // =========================================================================
    // Attempt
    // =========================================================================

    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        *self.phase.borrow()
    }

    #[must_use]
    pub fn subscribe_phase(&self) -> watch::Receiver<CheckoutPhase> {
        self.phase.subscribe()
    }

    /// Whether an attempt is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run one checkout attempt over the open form.
    ///
    /// The user is notified exactly once about the outcome, except when the
    /// call is rejected as [`CheckoutError::Busy`].
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] describing the first step that failed.
    pub async fn submit(&self) -> Result<Receipt, CheckoutError> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            debug!("Checkout already in progress");
            return Err(CheckoutError::Busy);
        };

        let attempt_id = AttemptId::new();
        let span = info_span!("checkout_attempt", %attempt_id);
        self.attempt(attempt_id).instrument(span).await
    }

    async fn attempt(&self, attempt_id: AttemptId) -> Result<Receipt, CheckoutError> {
        self.enter(CheckoutPhase::Validating);
        let (form, snapshot) = match self.preflight() {
            Ok(checked) => checked,
            Err(err) => {
                info!(error = %err, "Checkout rejected before submission");
                self.enter(CheckoutPhase::Idle);
                return Err(self.fail(err));
            }
        };

        let attempt = attempt_id.to_string();
        add_breadcrumb("checkout", "Creating order", Some(&[("attempt_id", attempt.as_str())]));
        self.enter(CheckoutPhase::CreatingOrder);
        let request = CreateOrderRequest::from(&form);
        let order = match self.bounded(self.services.orders.create_order(&request)).await {
            Ok(order) => order,
            Err(err) => {
                warn!(error = %err, "Order creation failed");
                let err = if err.is_unauthorized() {
                    CheckoutError::Auth
                } else {
                    CheckoutError::OrderCreation(err)
                };
                self.enter(CheckoutPhase::Failed {
                    cart_restored: false,
                });
                return Err(self.fail(err));
            }
        };
        info!(order_id = %order.id, total = %order.total, "Order created");

        let payment = if form.payment_method.is_card() {
            match self.pay(&order).await {
                Ok(confirmation) => Some(confirmation),
                Err(err) => {
                    self.cart.set(snapshot);
                    self.enter(CheckoutPhase::Failed {
                        cart_restored: true,
                    });
                    let event_id = report_orphaned_order(order.id, &err);
                    warn!(
                        order_id = %order.id,
                        error = %err,
                        sentry_event_id = %event_id,
                        "Payment failed after order creation; order left pending, cart display restored"
                    );
                    return Err(self.fail(err));
                }
            }
        } else {
            info!(payment_method = %form.payment_method, "No card payment step for this method");
            None
        };

        Ok(self.commit(attempt_id, order, payment))
    }

    /// Local checks that need no network.
    fn preflight(&self) -> Result<(CheckoutForm, CartSnapshot), CheckoutError> {
        let form = self.form().ok_or(CheckoutError::NotOpen)?;
        form.validate()?;
        let snapshot = self.cart.get();
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        Ok((form, snapshot))
    }

    async fn pay(&self, order: &Order) -> Result<PaymentConfirmation, CheckoutError> {
        add_breadcrumb("checkout", "Creating payment intent", None);
        self.enter(CheckoutPhase::CreatingIntent);
        let intent = self
            .bounded(self.services.payments.create_intent(order.id))
            .await
            .map_err(|e| payment_failure(order, PaymentStage::CreatingIntent, e))?;
        debug!(intent_id = %intent.id, "Payment intent created");

        self.enter(CheckoutPhase::ConfirmingPayment);
        let confirmation = self
            .bounded(self.services.payments.confirm_payment(&intent.id))
            .await
            .map_err(|e| payment_failure(order, PaymentStage::Confirming, e))?;

        if !confirmation.status.is_success() {
            warn!(status = %confirmation.status, "Payment not confirmed");
            return Err(payment_failure(
                order,
                PaymentStage::Confirming,
                ApiError::Rejected(None),
            ));
        }

        info!(intent_id = %confirmation.intent_id, "Payment confirmed");
        Ok(confirmation)
    }

    fn commit(
        &self,
        attempt_id: AttemptId,
        order: Order,
        payment: Option<PaymentConfirmation>,
    ) -> Receipt {
        self.cart.clear();
        self.form.send_replace(None);
        self.enter(CheckoutPhase::Committed);
        info!(order_id = %order.id, "Checkout committed");

        let messages = catalog(self.options.language);
        self.ui
            .notify(Notice::success(messages.order_confirmed(order.id)));
        self.ui.navigate(Route::OrderHistory);

        Receipt {
            attempt_id,
            order,
            payment,
        }
    }

    /// Tell the user about a failure and pass the error through.
    ///
    /// An auth failure also drops the session and sends the user to sign in.
    fn fail(&self, err: CheckoutError) -> CheckoutError {
        self.ui
            .notify(Notice::failure(err.user_message(self.options.language)));
        if matches!(err, CheckoutError::Auth) {
            self.session.clear();
            self.ui.navigate(Route::Login);
        }
        err
    }

    fn enter(&self, next: CheckoutPhase) {
        let previous = self.phase.send_replace(next);
        debug_assert!(
            previous.can_transition_to(next),
            "illegal checkout transition: {previous} -> {next}"
        );
        debug!(from = %previous, to = %next, "Checkout phase");
    }

    fn reset_finished_phase(&self) {
        self.phase.send_if_modified(|phase| {
            if phase.is_terminal() {
                *phase = CheckoutPhase::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Bound a remote call by the per-call timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        let limit = self.options.call_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(ApiError::Timeout(limit)))
    }
}

fn payment_failure(order: &Order, stage: PaymentStage, source: ApiError) -> CheckoutError {
    if source.is_unauthorized() {
        CheckoutError::Auth
    } else {
        CheckoutError::Payment {
            order_id: order.id,
            stage,
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, AtomicUsize};

    use async_trait::async_trait;
    use secrecy::SecretString;
    use tokio::sync::Notify;

    use furnistore_core::{OrderId, OrderStatus, PaymentIntentId, PaymentMethod, PaymentStatus};

    use super::*;
    use crate::models::cart::tests::{line, sofa_and_table};
    use crate::models::checkout::tests::valid_form;
    use crate::models::{FormField, PaymentIntent, ValidationError};

    #[derive(Debug, Clone, Copy)]
    enum Failure {
        Unauthorized,
        Rejected(&'static str),
        ServerError,
        /// Confirmation answers 2xx with a non-success status.
        Declined,
        /// Never answers.
        Hang,
    }

    impl Failure {
        async fn into_error(self) -> ApiError {
            match self {
                Self::Unauthorized => ApiError::Unauthorized,
                Self::Rejected(msg) => ApiError::Rejected(Some(msg.to_string())),
                Self::ServerError => ApiError::Status {
                    status: 500,
                    message: None,
                },
                Self::Declined => unreachable!("handled by confirm_payment"),
                Self::Hang => std::future::pending().await,
            }
        }
    }

    /// Scripted backend. Each configured failure fires once.
    struct FakeBackend {
        cart: Mutex<CartSnapshot>,
        next_order_id: AtomicI64,
        cart_calls: AtomicUsize,
        order_calls: AtomicUsize,
        intent_calls: AtomicUsize,
        confirm_calls: AtomicUsize,
        cart_failure: Mutex<Option<Failure>>,
        order_failure: Mutex<Option<Failure>>,
        intent_failure: Mutex<Option<Failure>>,
        confirm_failure: Mutex<Option<Failure>>,
        order_gate: Mutex<Option<Arc<Notify>>>,
        /// Display refreshed from the server right after an order is created.
        refreshed_display: Mutex<Option<CartRepository>>,
    }

    impl FakeBackend {
        fn new(cart: CartSnapshot) -> Self {
            Self {
                cart: Mutex::new(cart),
                next_order_id: AtomicI64::new(1000),
                cart_calls: AtomicUsize::new(0),
                order_calls: AtomicUsize::new(0),
                intent_calls: AtomicUsize::new(0),
                confirm_calls: AtomicUsize::new(0),
                cart_failure: Mutex::new(None),
                order_failure: Mutex::new(None),
                intent_failure: Mutex::new(None),
                confirm_failure: Mutex::new(None),
                order_gate: Mutex::new(None),
                refreshed_display: Mutex::new(None),
            }
        }

        fn calls(&self) -> (usize, usize, usize) {
            (
                self.order_calls.load(Ordering::SeqCst),
                self.intent_calls.load(Ordering::SeqCst),
                self.confirm_calls.load(Ordering::SeqCst),
            )
        }

        async fn cart_edit_failure(&self) -> Result<(), ApiError> {
            let failure = self.cart_failure.lock().unwrap().take();
            match failure {
                Some(failure) => Err(failure.into_error().await),
                None => Ok(()),
            }
        }

        /// Hold order creation until the returned handle is notified.
        fn gate_orders(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            *self.order_gate.lock().unwrap() = Some(gate.clone());
            gate
        }
    }

    #[async_trait]
    impl CartStore for FakeBackend {
        async fn fetch_cart(&self) -> Result<CartSnapshot, ApiError> {
            self.cart_calls.fetch_add(1, Ordering::SeqCst);
            let failure = self.cart_failure.lock().unwrap().take();
            if let Some(failure) = failure {
                return Err(failure.into_error().await);
            }
            Ok(self.cart.lock().unwrap().clone())
        }

        async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
            self.cart_edit_failure().await?;
            let mut cart = self.cart.lock().unwrap();
            if let Some(existing) = cart.lines.iter_mut().find(|l| l.product_id == product_id) {
                existing.quantity += quantity;
            } else {
                let id = product_id.as_i64();
                cart.lines
                    .push(line(id, &format!("Product {id}"), "100.00", quantity));
            }
            Ok(())
        }

        async fn update_item(&self, item_id: CartItemId, quantity: u32) -> Result<(), ApiError> {
            assert!(quantity >= 1, "quantity must be clamped before the call");
            self.cart_edit_failure().await?;
            let mut cart = self.cart.lock().unwrap();
            let line = cart
                .lines
                .iter_mut()
                .find(|l| l.item_id == item_id)
                .ok_or_else(item_not_found)?;
            line.quantity = quantity;
            Ok(())
        }

        async fn remove_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
            self.cart_edit_failure().await?;
            let mut cart = self.cart.lock().unwrap();
            let before = cart.lines.len();
            cart.lines.retain(|l| l.item_id != item_id);
            if cart.lines.len() == before {
                return Err(item_not_found());
            }
            Ok(())
        }
    }

    fn item_not_found() -> ApiError {
        ApiError::Status {
            status: 404,
            message: Some("Cart item not found".to_string()),
        }
    }

    #[async_trait]
    impl OrderService for FakeBackend {
        async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
            self.order_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.order_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let failure = self.order_failure.lock().unwrap().take();
            if let Some(failure) = failure {
                return Err(failure.into_error().await);
            }
            assert!(!request.shipping_address.is_empty());

            // Like the real backend, ordering empties the server-side cart.
            let cart = std::mem::take(&mut *self.cart.lock().unwrap());
            if let Some(display) = self.refreshed_display.lock().unwrap().as_ref() {
                display.clear();
            }
            Ok(Order {
                id: OrderId::new(self.next_order_id.fetch_add(1, Ordering::SeqCst)),
                status: OrderStatus::Pending,
                total: cart.total().unwrap(),
                items: cart.lines,
                created_at: None,
            })
        }
    }

    #[async_trait]
    impl PaymentService for FakeBackend {
        async fn create_intent(&self, order_id: OrderId) -> Result<PaymentIntent, ApiError> {
            self.intent_calls.fetch_add(1, Ordering::SeqCst);
            let failure = self.intent_failure.lock().unwrap().take();
            if let Some(failure) = failure {
                return Err(failure.into_error().await);
            }
            Ok(PaymentIntent {
                id: PaymentIntentId::new(format!("pi_test_{order_id}")),
                client_secret: SecretString::from("secret"),
            })
        }

        async fn confirm_payment(
            &self,
            intent_id: &PaymentIntentId,
        ) -> Result<PaymentConfirmation, ApiError> {
            self.confirm_calls.fetch_add(1, Ordering::SeqCst);
            let failure = self.confirm_failure.lock().unwrap().take();
            let status = match failure {
                None => PaymentStatus::Succeeded,
                Some(Failure::Declined) => PaymentStatus::Failed,
                Some(failure) => return Err(failure.into_error().await),
            };
            Ok(PaymentConfirmation {
                intent_id: intent_id.clone(),
                status,
            })
        }
    }

    #[derive(Default)]
    struct RecordingUi {
        notices: Mutex<Vec<Notice>>,
        routes: Mutex<Vec<Route>>,
    }

    impl RecordingUi {
        fn notices(&self) -> Vec<Notice> {
            self.notices.lock().unwrap().clone()
        }

        fn routes(&self) -> Vec<Route> {
            self.routes.lock().unwrap().clone()
        }
    }

    impl CheckoutUi for RecordingUi {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }

        fn navigate(&self, route: Route) {
            self.routes.lock().unwrap().push(route);
        }
    }

    struct Harness {
        orchestrator: Arc<CheckoutOrchestrator>,
        backend: Arc<FakeBackend>,
        ui: Arc<RecordingUi>,
        cart: CartRepository,
        session: SessionStore,
    }

    fn harness_with(options: CheckoutOptions) -> Harness {
        let backend = Arc::new(FakeBackend::new(sofa_and_table()));
        let ui = Arc::new(RecordingUi::default());
        let cart = CartRepository::new();
        cart.set(sofa_and_table());
        let session = SessionStore::with_token(SecretString::from("h.p.s"));
        let services = Collaborators {
            cart: backend.clone(),
            orders: backend.clone(),
            payments: backend.clone(),
        };
        let orchestrator = Arc::new(CheckoutOrchestrator::new(
            services,
            cart.clone(),
            session.clone(),
            ui.clone(),
            options,
        ));
        Harness {
            orchestrator,
            backend,
            ui,
            cart,
            session,
        }
    }

    fn harness() -> Harness {
        harness_with(CheckoutOptions::default())
    }

    /// Open the form and fill it for `method`.
    fn open_valid(h: &Harness, method: PaymentMethod) {
        assert!(h.orchestrator.open_checkout(None));
        assert!(h.orchestrator.update_form(|form| *form = valid_form(method)));
    }

    #[tokio::test]
    async fn test_card_checkout_commits() {
        let h = harness();
        open_valid(&h, PaymentMethod::CreditCard);

        let receipt = h.orchestrator.submit().await.unwrap();

        assert_eq!(receipt.order.id, OrderId::new(1000));
        assert_eq!(receipt.order.total.to_string(), "$2399.97");
        assert_eq!(receipt.payment.unwrap().status, PaymentStatus::Succeeded);
        assert_eq!(h.backend.calls(), (1, 1, 1));

        assert!(h.cart.get().is_empty());
        assert!(h.orchestrator.form().is_none());
        assert_eq!(h.orchestrator.phase(), CheckoutPhase::Committed);
        assert_eq!(
            h.ui.notices(),
            vec![Notice::success("Payment successful! Order ID: 1000")]
        );
        assert_eq!(h.ui.routes(), vec![Route::OrderHistory]);
        assert!(!h.orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_missing_field_makes_no_calls() {
        let h = harness();
        open_valid(&h, PaymentMethod::CreditCard);
        h.orchestrator.update_form(|form| form.email = "  ".to_string());

        let err = h.orchestrator.submit().await.unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::MissingField(FormField::Email))
        ));
        assert_eq!(h.backend.calls(), (0, 0, 0));
        assert_eq!(h.cart.get(), sofa_and_table());
        assert!(h.orchestrator.form().is_some());
        assert_eq!(h.orchestrator.phase(), CheckoutPhase::Idle);
        assert_eq!(
            h.ui.notices(),
            vec![Notice::failure("Email address is required")]
        );
        assert!(h.ui.routes().is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_form_or_cart() {
        let h = harness();
        assert!(matches!(
            h.orchestrator.submit().await,
            Err(CheckoutError::NotOpen)
        ));

        open_valid(&h, PaymentMethod::WechatPay);
        h.cart.clear();
        assert!(matches!(
            h.orchestrator.submit().await,
            Err(CheckoutError::EmptyCart)
        ));
        assert_eq!(h.backend.calls(), (0, 0, 0));
        assert_eq!(h.ui.notices().len(), 2);
    }

    #[tokio::test]
    async fn test_non_card_method_skips_payment() {
        let h = harness();
        open_valid(&h, PaymentMethod::AlipayHk);

        let receipt = h.orchestrator.submit().await.unwrap();

        assert!(receipt.payment.is_none());
        assert_eq!(h.backend.calls(), (1, 0, 0));
        assert!(h.cart.get().is_empty());
        assert_eq!(h.ui.routes(), vec![Route::OrderHistory]);
    }

    #[tokio::test]
    async fn test_order_failure_leaves_cart_and_skips_payment() {
        let h = harness();
        *h.backend.order_failure.lock().unwrap() = Some(Failure::Rejected("Product out of stock"));
        open_valid(&h, PaymentMethod::CreditCard);

        let err = h.orchestrator.submit().await.unwrap_err();

        assert!(matches!(err, CheckoutError::OrderCreation(_)));
        assert_eq!(h.backend.calls(), (1, 0, 0));
        assert_eq!(h.cart.get(), sofa_and_table());
        assert_eq!(
            h.orchestrator.phase(),
            CheckoutPhase::Failed {
                cart_restored: false
            }
        );
        assert_eq!(
            h.ui.notices(),
            vec![Notice::failure("Product out of stock")]
        );
        assert!(h.ui.routes().is_empty());
        assert!(h.orchestrator.form().is_some());
    }

    #[tokio::test]
    async fn test_intent_failure_restores_cart() {
        let h = harness();
        *h.backend.intent_failure.lock().unwrap() = Some(Failure::ServerError);
        open_valid(&h, PaymentMethod::CreditCard);

        *h.backend.refreshed_display.lock().unwrap() = Some(h.cart.clone());

        let err = h.orchestrator.submit().await.unwrap_err();

        assert_eq!(err.orphaned_order(), Some(OrderId::new(1000)));
        assert!(matches!(
            err,
            CheckoutError::Payment {
                stage: PaymentStage::CreatingIntent,
                ..
            }
        ));
        assert_eq!(h.backend.calls(), (1, 1, 0));
        assert_eq!(h.cart.get(), sofa_and_table());
        assert_eq!(
            h.orchestrator.phase(),
            CheckoutPhase::Failed {
                cart_restored: true
            }
        );
        assert_eq!(
            h.ui.notices(),
            vec![Notice::failure("Failed to create payment intent")]
        );
        assert!(h.ui.routes().is_empty());
    }

    #[tokio::test]
    async fn test_declined_confirmation_is_failure() {
        let h = harness();
        *h.backend.confirm_failure.lock().unwrap() = Some(Failure::Declined);
        open_valid(&h, PaymentMethod::CreditCard);

        let err = h.orchestrator.submit().await.unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Payment {
                stage: PaymentStage::Confirming,
                ..
            }
        ));
        assert_eq!(h.cart.get(), sofa_and_table());
        assert_eq!(
            h.ui.notices(),
            vec![Notice::failure("Payment confirmation failed")]
        );
    }

    #[tokio::test]
    async fn test_retry_after_payment_failure_creates_second_order() {
        let h = harness();
        *h.backend.confirm_failure.lock().unwrap() = Some(Failure::ServerError);
        open_valid(&h, PaymentMethod::CreditCard);

        let first = h.orchestrator.submit().await.unwrap_err();
        let second = h.orchestrator.submit().await.unwrap();

        assert_eq!(first.orphaned_order(), Some(OrderId::new(1000)));
        assert_eq!(second.order.id, OrderId::new(1001));
        assert_ne!(first.orphaned_order(), Some(second.order.id));
        assert_eq!(h.backend.calls(), (2, 2, 2));
        assert_eq!(h.ui.notices().len(), 2);
        assert_eq!(h.ui.routes(), vec![Route::OrderHistory]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let h = harness();
        *h.backend.intent_failure.lock().unwrap() = Some(Failure::Hang);
        open_valid(&h, PaymentMethod::CreditCard);

        let err = h.orchestrator.submit().await.unwrap_err();

        match err {
            CheckoutError::Payment {
                stage: PaymentStage::CreatingIntent,
                source: ApiError::Timeout(limit),
                ..
            } => assert_eq!(limit, Duration::from_secs(15)),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(h.cart.get(), sofa_and_table());
        assert!(!h.orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_busy() {
        let h = harness();
        let gate = h.backend.gate_orders();
        open_valid(&h, PaymentMethod::CreditCard);

        let first = tokio::spawn({
            let orchestrator = h.orchestrator.clone();
            async move { orchestrator.submit().await }
        });
        while !h.orchestrator.is_busy() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            h.orchestrator.submit().await,
            Err(CheckoutError::Busy)
        ));
        assert!(!h.orchestrator.cancel_checkout());
        assert!(matches!(
            h.orchestrator.add_to_cart(ProductId::new(3), 1).await,
            Err(CheckoutError::Busy)
        ));

        gate.notify_one();
        first.await.unwrap().unwrap();

        assert_eq!(h.backend.calls(), (1, 1, 1));
        assert_eq!(h.ui.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_reopening_checkout_mid_attempt_is_refused() {
        let h = harness();
        let gate = h.backend.gate_orders();
        open_valid(&h, PaymentMethod::CreditCard);
        let submitted_email = h.orchestrator.form().unwrap().email;

        let attempt = tokio::spawn({
            let orchestrator = h.orchestrator.clone();
            async move { orchestrator.submit().await }
        });
        while !h.orchestrator.is_busy() {
            tokio::task::yield_now().await;
        }

        let profile = UserProfile {
            email: Some("someone.else@example.com".to_string()),
            ..UserProfile::default()
        };
        assert!(!h.orchestrator.open_checkout(Some(&profile)));
        assert_eq!(h.orchestrator.form().unwrap().email, submitted_email);

        gate.notify_one();
        attempt.await.unwrap().unwrap();

        assert!(h.orchestrator.form().is_none());
        assert!(h.orchestrator.open_checkout(Some(&profile)));
        assert_eq!(
            h.orchestrator.form().unwrap().email,
            "someone.else@example.com"
        );
        assert_eq!(h.orchestrator.phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session_and_goes_to_login() {
        let h = harness();
        *h.backend.intent_failure.lock().unwrap() = Some(Failure::Unauthorized);
        open_valid(&h, PaymentMethod::CreditCard);

        let err = h.orchestrator.submit().await.unwrap_err();

        assert!(matches!(err, CheckoutError::Auth));
        assert!(!h.session.is_signed_in());
        assert_eq!(h.cart.get(), sofa_and_table());
        assert_eq!(
            h.ui.notices(),
            vec![Notice::failure("Please log in to continue")]
        );
        assert_eq!(h.ui.routes(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_load_cart() {
        let h = harness();
        h.cart.clear();

        let snapshot = h.orchestrator.load_cart().await.unwrap();
        assert_eq!(snapshot, sofa_and_table());
        assert_eq!(h.cart.get(), sofa_and_table());

        *h.backend.cart_failure.lock().unwrap() = Some(Failure::ServerError);
        assert!(h.orchestrator.load_cart().await.unwrap().is_empty());
        assert!(h.cart.get().is_empty());
        assert!(h.ui.notices().is_empty());

        *h.backend.cart_failure.lock().unwrap() = Some(Failure::Unauthorized);
        assert!(matches!(
            h.orchestrator.load_cart().await,
            Err(CheckoutError::Auth)
        ));
        assert_eq!(h.ui.routes(), vec![Route::Login]);
        assert_eq!(h.backend.cart_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cart_edits_refresh_display() {
        let h = harness();
        h.cart.clear();

        let snapshot = h.orchestrator.add_to_cart(ProductId::new(3), 2).await.unwrap();
        assert_eq!(snapshot.lines.len(), 3);
        assert_eq!(h.cart.get(), snapshot);

        let snapshot = h
            .orchestrator
            .update_cart_item(CartItemId::new(1), 0)
            .await
            .unwrap();
        assert_eq!(snapshot.line(CartItemId::new(1)).unwrap().quantity, 1);

        let snapshot = h
            .orchestrator
            .remove_cart_item(CartItemId::new(2))
            .await
            .unwrap();
        assert!(snapshot.line(CartItemId::new(2)).is_none());
        assert_eq!(h.cart.get(), snapshot);
        assert!(h.ui.notices().is_empty());
    }

    #[tokio::test]
    async fn test_cart_edit_failure_keeps_display() {
        let h = harness();

        let err = h
            .orchestrator
            .remove_cart_item(CartItemId::new(99))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::CartUpdate(_)));
        assert_eq!(h.cart.get(), sofa_and_table());
        assert_eq!(
            h.ui.notices(),
            vec![Notice::failure("Cart item not found")]
        );

        *h.backend.cart_failure.lock().unwrap() = Some(Failure::Unauthorized);
        assert!(matches!(
            h.orchestrator.add_to_cart(ProductId::new(1), 1).await,
            Err(CheckoutError::Auth)
        ));
        assert_eq!(h.ui.routes(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_form_lifecycle() {
        let h = harness();
        assert!(!h.orchestrator.update_form(|form| form.phone = "1".to_string()));

        let profile = UserProfile {
            first_name: Some("Tai Man".to_string()),
            last_name: Some("Chan".to_string()),
            ..UserProfile::default()
        };
        let mut rx = h.orchestrator.subscribe_form();
        assert!(h.orchestrator.open_checkout(Some(&profile)));
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            rx.borrow_and_update().as_ref().unwrap().contact_person,
            "Chan Tai Man"
        );

        assert!(h.orchestrator.update_form(|form| form.phone = "91234567".to_string()));
        assert_eq!(h.orchestrator.form().unwrap().phone, "91234567");

        assert!(h.orchestrator.cancel_checkout());
        assert!(h.orchestrator.form().is_none());
    }

    #[tokio::test]
    async fn test_phase_resets_when_reopened() {
        let h = harness();
        *h.backend.order_failure.lock().unwrap() = Some(Failure::ServerError);
        open_valid(&h, PaymentMethod::CreditCard);
        h.orchestrator.submit().await.unwrap_err();
        assert!(h.orchestrator.phase().is_terminal());

        assert!(h.orchestrator.open_checkout(None));
        assert_eq!(h.orchestrator.phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_messages_follow_language() {
        let h = harness_with(CheckoutOptions {
            language: Language::ZhHant,
            ..CheckoutOptions::default()
        });
        open_valid(&h, PaymentMethod::CreditCard);

        h.orchestrator.submit().await.unwrap();

        assert_eq!(
            h.ui.notices(),
            vec![Notice::success("付款成功！訂單編號：1000")]
        );
    }
}

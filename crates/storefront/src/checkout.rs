//! Checkout orchestration.
//!
//! A state machine over one checkout attempt:
//!
//! ```text
//! Idle -> Validating -> Submitting -> PaymentProcessing -> ShippingLabeling -> Completed
//!                \___________\______________\_____________________/
//!                                  Failed
//! ```
//!
//! A submit lock rejects re-entrant submission while an attempt is in
//! flight, so rapid repeated input can create at most one order.
//!
//! # Partial failure policy
//!
//! Once order creation succeeds the order is never rolled back. A failed
//! payment step surfaces the order id in the outcome for support
//! follow-up, and the cart stays intact. A failed label step is logged
//! and swallowed - the order and payment already succeeded. The cart is
//! cleared only on full completion, never before the order exists.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use coralcart_core::{Email, EmailError, PaymentMethod, PaymentProcessor, to_cents};

use crate::auth::Session;
use crate::cart::CartService;
use crate::gateway::{
    ApiError, CardDetails, CartItem, CustomerInfo, Gateway, Order, OrderDraft, OrderLine,
    OrderSummary, PaymentReceipt, PaymentRequest, ShippingLabel,
};
use crate::payment::{CardError, validate_card};
use crate::shipping::ShippingService;
use crate::storage::{LocalStore, keys};

/// Phases of a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    PaymentProcessing,
    ShippingLabeling,
    Completed,
    Failed,
}

/// Everything collected on the checkout form.
#[derive(Debug, Clone)]
pub struct CheckoutForm {
    pub customer: CustomerInfo,
    pub payment_method: PaymentMethod,
    /// Required when paying by card.
    pub card: Option<CardDetails>,
    pub shipping_method: coralcart_core::ShippingMethod,
}

/// Form-level failures. Purely local; none of these reach the network.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    Card(#[from] CardError),
}

/// Errors that abort a checkout attempt.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("your cart is empty")]
    EmptyCart,

    /// A submission is already in flight (the submit lock).
    #[error("an order is already being processed")]
    SubmissionInFlight,

    /// The form failed local validation; no network call was made.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Order creation itself failed; nothing exists server-side.
    #[error("order submission failed: {0}")]
    OrderSubmit(#[source] ApiError),
}

/// The result of a checkout attempt that got past order creation.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Order created; payment (when due) and labeling succeeded.
    Completed {
        order: Order,
        /// Present for card payments.
        receipt: Option<PaymentReceipt>,
        /// Present when a carrier rate was selected and labeling worked.
        label: Option<ShippingLabel>,
    },
    /// The order exists server-side but its payment failed. Surfaced, not
    /// rolled back; the cart is left intact.
    PaymentFailed { order: Order, error: ApiError },
}

/// The checkout orchestrator.
pub struct CheckoutService<G> {
    gateway: Arc<G>,
    store: LocalStore,
    phase: CheckoutPhase,
    in_flight: bool,
}

impl<G: Gateway> CheckoutService<G> {
    pub fn new(gateway: Arc<G>, store: LocalStore) -> Self {
        Self {
            gateway,
            store,
            phase: CheckoutPhase::Idle,
            in_flight: false,
        }
    }

    /// Run one checkout attempt end to end.
    ///
    /// # Errors
    ///
    /// Returns an error when a submission is already in flight, the cart
    /// is empty, the form fails validation (all before any network call),
    /// or order creation fails. Payment failure after order creation is
    /// NOT an error - it is the [`CheckoutOutcome::PaymentFailed`]
    /// outcome, carrying the order id.
    pub async fn place_order(
        &mut self,
        cart: &mut CartService<G>,
        session: &Session,
        shipping: &ShippingService<G>,
        form: &CheckoutForm,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        if self.in_flight {
            return Err(CheckoutError::SubmissionInFlight);
        }
        self.in_flight = true;
        let result = self.run(cart, session, shipping, form).await;
        self.in_flight = false;
        if result.is_err() {
            self.phase = CheckoutPhase::Failed;
        }
        result
    }

    async fn run(
        &mut self,
        cart: &mut CartService<G>,
        session: &Session,
        shipping: &ShippingService<G>,
        form: &CheckoutForm,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        self.phase = CheckoutPhase::Validating;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        validate_form(form)?;

        self.phase = CheckoutPhase::Submitting;
        let draft = build_draft(cart, shipping, form);
        let order = self
            .gateway
            .create_order(&draft)
            .await
            .map_err(CheckoutError::OrderSubmit)?;
        info!(order_id = %order.id, "order created");

        let mut receipt = None;
        if form.payment_method == PaymentMethod::Card {
            self.phase = CheckoutPhase::PaymentProcessing;
            // Validation guarantees card details are present for card
            // payments; a missing card at this point is a validation gap,
            // surfaced as a payment failure rather than a panic.
            let Some(card) = form.card.as_ref() else {
                self.phase = CheckoutPhase::Failed;
                return Ok(CheckoutOutcome::PaymentFailed {
                    order,
                    error: ApiError::Malformed("card details missing".to_string()),
                });
            };

            let request = PaymentRequest {
                amount_cents: to_cents(draft.summary.total),
                order_id: order.id.clone(),
                card: card.clone(),
                processor: PaymentProcessor::Stripe,
            };
            match self.gateway.process_payment(&request).await {
                Ok(paid) => receipt = Some(paid),
                Err(error) => {
                    // The order exists; report it rather than roll it back.
                    warn!(order_id = %order.id, %error, "order created but payment failed");
                    self.phase = CheckoutPhase::Failed;
                    return Ok(CheckoutOutcome::PaymentFailed { order, error });
                }
            }
        }

        let mut label = None;
        if shipping.selected_rate().is_some() {
            self.phase = CheckoutPhase::ShippingLabeling;
            match shipping.create_label(&order.id).await {
                Ok(created) => label = Some(created),
                Err(error) => {
                    // Best effort only; the order and payment already
                    // succeeded.
                    warn!(order_id = %order.id, %error, "shipping label creation failed");
                }
            }
        }

        cart.clear(session).await;
        self.store.set(keys::LAST_ORDER, &order);
        self.phase = CheckoutPhase::Completed;
        info!(order_id = %order.id, "checkout completed");

        Ok(CheckoutOutcome::Completed {
            order,
            receipt,
            label,
        })
    }

    /// Current phase of the most recent attempt.
    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// Whether a submission is currently in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// The most recently completed order, persisted for the confirmation
    /// view.
    #[must_use]
    pub fn last_order(&self) -> Option<Order> {
        self.store.get(keys::LAST_ORDER)
    }
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Required-field and format checks. Purely local.
fn validate_form(form: &CheckoutForm) -> Result<(), ValidationError> {
    require(&form.customer.first_name, "first name")?;
    require(&form.customer.last_name, "last name")?;
    require(&form.customer.email, "email")?;
    Email::parse(&form.customer.email)?;
    require(&form.customer.address.line1, "address")?;
    require(&form.customer.address.city, "city")?;
    require(&form.customer.address.state, "state")?;
    require(&form.customer.address.postal_code, "zip code")?;

    if form.payment_method == PaymentMethod::Card {
        let card = form
            .card
            .as_ref()
            .ok_or(ValidationError::MissingField("card details"))?;
        validate_card(card)?;
    }

    Ok(())
}

/// Snapshot the cart and compute the order summary.
///
/// The shipping figure prefers the selected carrier rate; without one the
/// cart engine's flat-fee rule applies.
fn build_draft<G: Gateway>(
    cart: &CartService<G>,
    shipping: &ShippingService<G>,
    form: &CheckoutForm,
) -> OrderDraft {
    let items = cart.items().iter().map(order_line).collect();

    let subtotal = cart.subtotal();
    let tax = cart.tax(subtotal);
    let shipping_cost = shipping
        .selected_rate()
        .map_or_else(|| cart.shipping(subtotal), |rate| rate.amount);

    OrderDraft {
        customer: form.customer.clone(),
        items,
        summary: OrderSummary::new(subtotal, shipping_cost, tax),
        payment_method: form.payment_method,
        shipping_method: form.shipping_method,
    }
}

fn order_line(item: &CartItem) -> OrderLine {
    OrderLine {
        product_id: item.product_id.clone(),
        title: item.title.clone(),
        price: item.price,
        quantity: item.quantity,
        image: item.image.clone(),
    }
}

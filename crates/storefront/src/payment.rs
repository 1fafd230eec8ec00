//! Payment collection: card format checks and gateway payment calls.
//!
//! Card validation here is superficial by design - length and pattern
//! checks that catch typos before a network call. Real card validation and
//! PCI handling are the payment processor's responsibility.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use coralcart_core::{OrderId, PaymentProcessor};

use crate::gateway::{
    ApiError, CardDetails, Gateway, PaymentIntent, PaymentIntentRequest, PaymentReceipt,
    PaymentRequest,
};

/// Card format errors, shown inline on the payment form.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CardError {
    /// Number must be 13-19 digits once separators are stripped.
    #[error("please enter a valid card number")]
    InvalidNumber,

    /// Expiry must match `MM/YY`.
    #[error("please enter a valid expiry date (MM/YY)")]
    InvalidExpiry,

    /// CVV must be 3-4 digits.
    #[error("please enter a valid CVV")]
    InvalidCvv,

    /// Cardholder name is required.
    #[error("please enter the cardholder name")]
    MissingHolderName,
}

/// Format-check card details. Purely local; no network call.
///
/// # Errors
///
/// Returns the first failing check: number length/digits, `MM/YY` expiry,
/// CVV length, missing holder name.
pub fn validate_card(card: &CardDetails) -> Result<(), CardError> {
    let digits: Vec<char> = card
        .number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if digits.len() < 13 || digits.len() > 19 || !digits.iter().all(char::is_ascii_digit) {
        return Err(CardError::InvalidNumber);
    }

    if !is_expiry_format(&card.expiry) {
        return Err(CardError::InvalidExpiry);
    }

    let cvv_ok = (3..=4).contains(&card.cvv.len()) && card.cvv.chars().all(|c| c.is_ascii_digit());
    if !cvv_ok {
        return Err(CardError::InvalidCvv);
    }

    if card.holder_name.trim().is_empty() {
        return Err(CardError::MissingHolderName);
    }

    Ok(())
}

/// `MM/YY`: two digits, a slash, two digits.
fn is_expiry_format(expiry: &str) -> bool {
    matches!(
        expiry.as_bytes(),
        [m1, m2, b'/', y1, y2]
            if m1.is_ascii_digit() && m2.is_ascii_digit() && y1.is_ascii_digit() && y2.is_ascii_digit()
    )
}

/// Thin wrapper over the gateway's payment endpoints.
pub struct PaymentService<G> {
    gateway: Arc<G>,
}

impl<G: Gateway> PaymentService<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Create a payment intent for an order.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        order_id: &OrderId,
    ) -> Result<PaymentIntent, ApiError> {
        let request = PaymentIntentRequest {
            amount_cents,
            currency: currency.to_string(),
            order_id: order_id.clone(),
        };
        let intent = self.gateway.create_payment_intent(&request).await?;
        info!(intent_id = %intent.id, "created payment intent");
        Ok(intent)
    }

    /// Confirm a payment intent with card data.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn confirm_intent(
        &self,
        intent_id: &str,
        card: &CardDetails,
        processor: PaymentProcessor,
    ) -> Result<PaymentReceipt, ApiError> {
        self.gateway
            .confirm_payment_intent(intent_id, card, processor)
            .await
    }

    /// Fetch a payment intent.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn intent(&self, intent_id: &str) -> Result<PaymentIntent, ApiError> {
        self.gateway.get_payment_intent(intent_id).await
    }

    /// Process a payment directly, without an intent.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; on failure no transaction exists.
    pub async fn process(
        &self,
        amount_cents: i64,
        order_id: &OrderId,
        card: &CardDetails,
        processor: PaymentProcessor,
    ) -> Result<PaymentReceipt, ApiError> {
        let request = PaymentRequest {
            amount_cents,
            order_id: order_id.clone(),
            card: card.clone(),
            processor,
        };
        let receipt = self.gateway.process_payment(&request).await?;
        info!(transaction_id = %receipt.transaction_id, "payment processed");
        Ok(receipt)
    }

    /// Refund a transaction; zero amount means a full refund.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn refund(
        &self,
        transaction_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> Result<PaymentReceipt, ApiError> {
        self.gateway
            .refund_payment(transaction_id, amount, reason)
            .await
    }

    /// Fetch one transaction.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn transaction(&self, transaction_id: &str) -> Result<PaymentReceipt, ApiError> {
        self.gateway.get_transaction(transaction_id).await
    }

    /// The authenticated user's payment history.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn history(&self) -> Result<Vec<PaymentReceipt>, ApiError> {
        self.gateway.payment_history().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn card(number: &str, expiry: &str, cvv: &str) -> CardDetails {
        CardDetails {
            number: number.to_string(),
            expiry: expiry.to_string(),
            cvv: cvv.to_string(),
            holder_name: "Sam Tester".to_string(),
        }
    }

    #[test]
    fn test_valid_cards() {
        assert!(validate_card(&card("4242424242424242", "12/30", "123")).is_ok());
        // Separators are stripped before the length check.
        assert!(validate_card(&card("4242 4242 4242 4242", "01/27", "1234")).is_ok());
        assert!(validate_card(&card("4242-4242-4242-4242", "01/27", "999")).is_ok());
        // 13 and 19 digits are the inclusive bounds.
        assert!(validate_card(&card("4".repeat(13).as_str(), "12/30", "123")).is_ok());
        assert!(validate_card(&card("4".repeat(19).as_str(), "12/30", "123")).is_ok());
    }

    #[test]
    fn test_short_number_rejected() {
        assert_eq!(
            validate_card(&card("1234", "12/30", "123")),
            Err(CardError::InvalidNumber)
        );
    }

    #[test]
    fn test_non_digit_number_rejected() {
        assert_eq!(
            validate_card(&card("4242x242424242424", "12/30", "123")),
            Err(CardError::InvalidNumber)
        );
    }

    #[test]
    fn test_expiry_pattern() {
        assert_eq!(
            validate_card(&card("4242424242424242", "1/30", "123")),
            Err(CardError::InvalidExpiry)
        );
        assert_eq!(
            validate_card(&card("4242424242424242", "12-30", "123")),
            Err(CardError::InvalidExpiry)
        );
        assert_eq!(
            validate_card(&card("4242424242424242", "12/2030", "123")),
            Err(CardError::InvalidExpiry)
        );
    }

    #[test]
    fn test_cvv_bounds() {
        assert_eq!(
            validate_card(&card("4242424242424242", "12/30", "12")),
            Err(CardError::InvalidCvv)
        );
        assert_eq!(
            validate_card(&card("4242424242424242", "12/30", "12345")),
            Err(CardError::InvalidCvv)
        );
    }

    #[test]
    fn test_missing_holder_name() {
        let mut c = card("4242424242424242", "12/30", "123");
        c.holder_name = "  ".to_string();
        assert_eq!(validate_card(&c), Err(CardError::MissingHolderName));
    }
}

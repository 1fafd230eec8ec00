//! Remote commerce gateway client.
//!
//! # Architecture
//!
//! - [`Gateway`] is the full logical contract of the remote REST API:
//!   products, cart, orders, users/auth, payments, shipping. The engines
//!   depend on the trait, which is what makes them testable without a
//!   network.
//! - [`HttpGateway`] implements it with `reqwest` over JSON/HTTP, with a
//!   bearer-token auth header when a session token is installed and an
//!   in-memory product cache (`moka`, 5-minute TTL).
//! - [`wire`] holds the normalization adapters that flatten the gateway's
//!   heterogeneous payload shapes into the canonical [`types`].
//!
//! # Example
//!
//! ```rust,ignore
//! use coralcart_storefront::gateway::{Gateway, HttpGateway};
//!
//! let gateway = HttpGateway::new(&config);
//! let page = gateway.list_products(&ProductFilters::default()).await?;
//! gateway.add_to_cart(&page.products[0].id, 1).await?;
//! ```

mod http;
pub mod types;
pub mod wire;

pub use http::HttpGateway;
pub use types::*;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use coralcart_core::{OrderId, OrderStatus, ProductId, UserId};

/// Errors from gateway calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, read, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("gateway returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or rejected credentials (HTTP 401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The response parsed as JSON but lacked required structure.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// The remote gateway's logical contract.
///
/// All methods return canonical types; wire normalization is an
/// implementation concern. Calls are sequential and awaited by a single
/// caller, so no method requires `&mut self` - implementations hold their
/// own interior state (auth token, caches).
#[allow(async_fn_in_trait)]
pub trait Gateway {
    // -- Products -----------------------------------------------------------

    /// List products matching `filters`, paginated.
    async fn list_products(&self, filters: &ProductFilters) -> Result<ProductPage, ApiError>;

    /// Fetch one product by id.
    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError>;

    /// Create a product (admin).
    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError>;

    /// Update a product (admin).
    async fn update_product(&self, id: &ProductId, draft: &ProductDraft)
    -> Result<Product, ApiError>;

    /// Delete a product (admin).
    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError>;

    // -- Cart ---------------------------------------------------------------

    /// Fetch the authenticated user's cart.
    async fn get_cart(&self) -> Result<Vec<CartItem>, ApiError>;

    /// Add a product to the server cart.
    async fn add_to_cart(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError>;

    /// Set the quantity of a cart line.
    async fn update_cart_item(&self, product_id: &ProductId, quantity: u32)
    -> Result<(), ApiError>;

    /// Remove a cart line.
    async fn remove_from_cart(&self, product_id: &ProductId) -> Result<(), ApiError>;

    /// Empty the server cart.
    async fn clear_cart(&self) -> Result<(), ApiError>;

    // -- Orders -------------------------------------------------------------

    /// Submit an order.
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, ApiError>;

    /// List all orders (admin).
    async fn list_orders(&self) -> Result<Vec<Order>, ApiError>;

    /// List the authenticated user's orders.
    async fn my_orders(&self) -> Result<Vec<Order>, ApiError>;

    /// Fetch one order by id.
    async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError>;

    /// Update an order's status (admin).
    async fn update_order_status(&self, id: &OrderId, status: OrderStatus)
    -> Result<Order, ApiError>;

    // -- Users & auth -------------------------------------------------------

    /// Exchange credentials for a token and user record.
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError>;

    /// Create an account; returns a token and user record.
    async fn register(&self, registration: &Registration) -> Result<AuthGrant, ApiError>;

    /// Fetch one user by id.
    async fn get_user(&self, id: &UserId) -> Result<User, ApiError>;

    /// Update a user record (admin).
    async fn update_user(&self, id: &UserId, name: &str, role: Option<&str>)
    -> Result<User, ApiError>;

    /// Delete a user (admin).
    async fn delete_user(&self, id: &UserId) -> Result<(), ApiError>;

    /// List all users (admin).
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    // -- Payments -----------------------------------------------------------

    /// Create a payment intent.
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError>;

    /// Confirm a previously created payment intent with card data.
    async fn confirm_payment_intent(
        &self,
        intent_id: &str,
        card: &CardDetails,
        processor: coralcart_core::PaymentProcessor,
    ) -> Result<PaymentReceipt, ApiError>;

    /// Fetch a payment intent.
    async fn get_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, ApiError>;

    /// Process a payment directly, without an intent.
    async fn process_payment(&self, request: &PaymentRequest) -> Result<PaymentReceipt, ApiError>;

    /// Refund a transaction, fully (amount zero) or partially.
    async fn refund_payment(
        &self,
        transaction_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> Result<PaymentReceipt, ApiError>;

    /// Fetch one transaction.
    async fn get_transaction(&self, transaction_id: &str) -> Result<PaymentReceipt, ApiError>;

    /// List the authenticated user's payment history.
    async fn payment_history(&self) -> Result<Vec<PaymentReceipt>, ApiError>;

    // -- Shipping -----------------------------------------------------------

    /// Quote carrier rates for a package and destination.
    async fn shipping_rates(
        &self,
        package: &PackageInfo,
        destination: &Destination,
    ) -> Result<Vec<ShippingRate>, ApiError>;

    /// Purchase a shipping label for an order.
    async fn create_shipping_label(
        &self,
        order_id: &OrderId,
        rate: &ShippingRate,
        package: &PackageInfo,
    ) -> Result<ShippingLabel, ApiError>;

    /// Track a shipment by tracking number.
    async fn track_shipment(&self, tracking_number: &str) -> Result<TrackingInfo, ApiError>;

    /// List shipments created for an order.
    async fn order_shipping(&self, order_id: &OrderId) -> Result<Vec<ShippingLabel>, ApiError>;

    /// Cancel a shipment.
    async fn cancel_shipment(&self, shipment_id: &str) -> Result<(), ApiError>;

    // -- Session ------------------------------------------------------------

    /// Install (or clear) the bearer token sent with authenticated calls.
    fn set_auth_token(&self, token: Option<SecretString>);
}

//! Canonical storefront types.
//!
//! Everything here is the *normalized* form of a gateway resource: one
//! field per fact, decimals for money, typed ids. The raw wire shapes
//! (alternate key names, nested product references, stringly numbers) are
//! flattened into these types by [`super::wire`] and never escape the
//! gateway module.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coralcart_core::{
    Email, OrderId, OrderStatus, PaymentIntentId, PaymentMethod, PaymentProcessor, ProductId,
    ShipmentId, ShippingMethod, TransactionId, UserId, UserRole, round_cents,
};

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Image URLs, most prominent first.
    pub images: Vec<String>,
    /// Categories, flattened from the wire's single-value-or-list field.
    pub categories: Vec<String>,
    pub stock: i64,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// First image URL, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Fields accepted when creating or updating a product (admin console).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub images: Vec<String>,
    pub categories: Vec<String>,
    pub stock: i64,
    pub is_active: bool,
}

/// One page of a product listing, with pagination metadata.
#[derive(Debug, Clone, Default)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
}

/// Query filters for the product listing endpoint.
///
/// Prices are in currency units here; the HTTP gateway converts the bounds
/// to integer cents, which is what the backend expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            category: None,
            min_price: None,
            max_price: None,
            is_active: None,
            search: None,
            page: 1,
            limit: 12,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One cart line, unique per product.
///
/// Display fields are denormalized: snapshotted from the product at
/// add-time in local mode, refreshed from the server's nested product
/// reference in server mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub category: Option<String>,
    pub quantity: u32,
    pub stock: Option<i64>,
    pub is_active: bool,
}

impl CartItem {
    /// Snapshot a cart line from a fetched product.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            image: product.images.first().cloned(),
            category: product.categories.first().cloned(),
            quantity,
            stock: Some(product.stock),
            is_active: product.is_active,
        }
    }

    /// Minimal placeholder line used when the product detail fetch fails
    /// during a local add. Price is zero until the product can be refreshed.
    #[must_use]
    pub fn placeholder(product_id: ProductId, quantity: u32) -> Self {
        let title = format!("Product {product_id}");
        Self {
            product_id,
            title,
            price: Decimal::ZERO,
            image: None,
            category: None,
            quantity,
            stock: None,
            is_active: true,
        }
    }

    /// `price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Shipping or billing address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Customer information collected on the checkout form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Address,
    /// `None` means "same as shipping address".
    pub billing_address: Option<Address>,
}

impl CustomerInfo {
    /// Full name as submitted to the gateway.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One order line, snapshotted from the cart at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub quantity: u32,
    pub image: Option<String>,
}

/// Computed order totals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// Build a summary from its parts, rounding every figure to cents.
    #[must_use]
    pub fn new(subtotal: Decimal, shipping: Decimal, tax: Decimal) -> Self {
        Self {
            subtotal: round_cents(subtotal),
            shipping: round_cents(shipping),
            tax: round_cents(tax),
            total: round_cents(subtotal + shipping + tax),
        }
    }
}

/// The write-once order submission payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer: CustomerInfo,
    pub items: Vec<OrderLine>,
    pub summary: OrderSummary,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
}

/// An order as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    pub items: Vec<OrderLine>,
    pub summary: Option<OrderSummary>,
    pub payment_method: Option<PaymentMethod>,
    pub shipping_method: Option<ShippingMethod>,
    pub user_id: Option<UserId>,
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Users & auth
// =============================================================================

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Absent on accounts created before roles existed. An absent role is
    /// never treated as admin.
    pub role: Option<UserRole>,
}

impl User {
    /// Whether this user may open the admin console.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Some(UserRole::Admin)
    }
}

/// Login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

/// Registration payload.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: String,
}

/// A successful login or registration: bearer token plus user record.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub token: String,
    pub user: User,
}

// =============================================================================
// Payments
// =============================================================================

/// Card data collected from the payment form.
///
/// Only superficially format-checked client-side; real validation is the
/// payment processor's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    /// `MM/YY`.
    pub expiry: String,
    pub cvv: String,
    pub holder_name: String,
}

/// Request to create a payment intent.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub order_id: OrderId,
}

/// A payment intent created by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub status: String,
    pub amount_cents: i64,
    pub client_secret: Option<String>,
}

/// Request to process a payment directly (no intent).
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub amount_cents: i64,
    pub order_id: OrderId,
    pub card: CardDetails,
    pub processor: PaymentProcessor,
}

/// A completed (or attempted) payment transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: TransactionId,
    pub status: String,
    pub amount_cents: i64,
}

// =============================================================================
// Shipping
// =============================================================================

/// Physical package characteristics used to quote rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub weight_lbs: Decimal,
    pub length_in: Decimal,
    pub width_in: Decimal,
    pub height_in: Decimal,
}

/// Destination used to quote rates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Destination {
    pub country: String,
    pub state: String,
    pub city: String,
    pub postal_code: String,
}

/// A single carrier quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingRate {
    pub carrier_name: String,
    pub service_name: String,
    pub amount: Decimal,
    pub estimated_days: u32,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// A purchased shipping label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingLabel {
    pub shipment_id: ShipmentId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub label_url: Option<String>,
}

/// Tracking status for a shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub tracking_number: String,
    pub status: String,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

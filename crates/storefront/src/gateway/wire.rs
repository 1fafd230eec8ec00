//! Wire-shape normalization.
//!
//! The gateway is not consistent about payload shapes: cart items arrive
//! under `items`, `cart.items`, `data`, or as a bare array; entities carry
//! `_id` or `id`; cart rows are flat or wrap a nested `product` reference;
//! products expose `title` or `name` and one-or-many images and categories.
//! Every adapter in this module maps those shapes into one canonical type
//! so the engines above the gateway never sniff shapes themselves.
//!
//! Adapters are total wherever a default is safe: a malformed price
//! becomes zero, a missing quantity becomes one, an unknown order status
//! becomes `pending`. Rows without any identity are dropped with a
//! warning.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use coralcart_core::{
    OrderId, OrderStatus, PaymentIntentId, PaymentMethod, ProductId, ShipmentId, ShippingMethod,
    TransactionId, UserId, UserRole, lenient_decimal, lenient_quantity,
};

use super::types::{
    AuthGrant, CartItem, Order, OrderLine, OrderSummary, PaymentIntent, PaymentReceipt, Product,
    ProductPage, ShippingLabel, ShippingRate, TrackingInfo, User,
};

// =============================================================================
// Primitive coercions
// =============================================================================

/// First non-null string value among `keys`.
fn first_str(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(key))
        .find_map(|v| v.as_str().map(ToString::to_string))
}

/// A string, or the first string of an array.
fn str_or_first(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(|v| v.as_str().map(ToString::to_string)),
        _ => None,
    }
}

/// A single value or a list, flattened into a list of strings.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn bool_or(value: Option<&Value>, default: bool) -> bool {
    value.and_then(Value::as_bool).unwrap_or(default)
}

fn datetime(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Entity identity: `_id` wins over `id` (the backend's own convention).
fn entity_id(value: &Value) -> Option<String> {
    first_str(value, &["_id", "id"])
}

/// The list payload under one of `keys`, or the payload itself if it is
/// already a bare array.
fn unwrap_list<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    if let Value::Array(items) = payload {
        return Some(items);
    }
    keys.iter()
        .filter_map(|key| lookup_path(payload, key))
        .find_map(Value::as_array)
}

/// Dotted-path lookup (`cart.items`).
fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

// =============================================================================
// Cart
// =============================================================================

/// Normalize any observed cart payload into canonical cart items.
///
/// Accepted containers: `items`, `cart.items`, `data`, or a bare array.
/// Rows without an identity or with a non-positive quantity are dropped.
#[must_use]
pub fn cart_items(payload: &Value) -> Vec<CartItem> {
    let Some(rows) = unwrap_list(payload, &["items", "cart.items", "data"]) else {
        debug!("cart payload had no recognizable item list, treating as empty");
        return Vec::new();
    };

    rows.iter().filter_map(cart_item).collect()
}

/// Normalize one cart row, flat or with a nested `product` reference.
#[must_use]
pub fn cart_item(row: &Value) -> Option<CartItem> {
    let product = row.get("product").filter(|p| p.is_object());

    // Identity may live on the row or on the nested product.
    let id = entity_id(row)
        .or_else(|| product.and_then(entity_id))
        .or_else(|| first_str(row, &["productId"]));
    let Some(id) = id else {
        warn!("dropping cart row without a product id");
        return None;
    };

    let quantity = row
        .get("quantity")
        .map_or(1, |q| lenient_quantity(q));
    if quantity == 0 {
        warn!(product_id = %id, "dropping cart row with non-positive quantity");
        return None;
    }

    // Row price wins when present; the nested product's price is the
    // fallback; anything unparseable is zero, never NaN.
    let price = price_of(row, product);

    let title = first_str(row, &["title", "name"])
        .or_else(|| product.and_then(|p| first_str(p, &["title", "name"])))
        .unwrap_or_else(|| "Unknown Product".to_string());

    let image = image_of(row).or_else(|| product.and_then(image_of));

    let category = row
        .get("category")
        .and_then(str_or_first)
        .or_else(|| product.and_then(|p| p.get("category").and_then(str_or_first)));

    let stock = row
        .get("stock")
        .and_then(lenient_i64)
        .or_else(|| product.and_then(|p| p.get("stock").and_then(lenient_i64)));

    let is_active = row
        .get("isActive")
        .or_else(|| product.and_then(|p| p.get("isActive")))
        .and_then(Value::as_bool)
        .unwrap_or(true);

    Some(CartItem {
        product_id: ProductId::new(id),
        title,
        price,
        image,
        category,
        quantity,
        stock,
        is_active,
    })
}

fn price_of(row: &Value, product: Option<&Value>) -> Decimal {
    let own = row.get("price").filter(|v| !v.is_null());
    let inherited = product.and_then(|p| p.get("price")).filter(|v| !v.is_null());
    own.or(inherited).map_or(Decimal::ZERO, lenient_decimal)
}

fn image_of(value: &Value) -> Option<String> {
    ["image", "images", "imageUrl"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(str_or_first)
}

// =============================================================================
// Products
// =============================================================================

/// Normalize one product payload. `None` if it carries no identity.
#[must_use]
pub fn product(payload: &Value) -> Option<Product> {
    let id = entity_id(payload)?;

    Some(Product {
        id: ProductId::new(id),
        title: first_str(payload, &["title", "name"]).unwrap_or_else(|| "Unknown Product".into()),
        description: first_str(payload, &["description"]),
        price: payload.get("price").map_or(Decimal::ZERO, lenient_decimal),
        images: images_of(payload),
        categories: payload.get("category").map(string_list).unwrap_or_default(),
        stock: payload.get("stock").and_then(lenient_i64).unwrap_or(0),
        is_active: bool_or(payload.get("isActive"), true),
        created_at: datetime(payload.get("createdAt")),
    })
}

fn images_of(payload: &Value) -> Vec<String> {
    ["images", "image", "imageUrl"]
        .iter()
        .filter_map(|key| payload.get(*key))
        .map(string_list)
        .find(|list| !list.is_empty())
        .unwrap_or_default()
}

/// Normalize a product listing payload.
///
/// Either `{products, total, page, pages}` or a bare array (for which a
/// single page is synthesized). Anything else is an empty page.
#[must_use]
pub fn product_page(payload: &Value) -> ProductPage {
    let rows = unwrap_list(payload, &["products", "data"]);
    let Some(rows) = rows else {
        debug!("product listing had no recognizable product array");
        return ProductPage::default();
    };

    let products: Vec<Product> = rows.iter().filter_map(product).collect();
    let count = products.len() as u64;

    ProductPage {
        total: payload
            .get("total")
            .and_then(lenient_i64)
            .map_or(count, |t| t.max(0) as u64),
        page: payload
            .get("page")
            .and_then(lenient_i64)
            .map_or(1, |p| u32::try_from(p).unwrap_or(1)),
        pages: payload
            .get("pages")
            .and_then(lenient_i64)
            .map_or(1, |p| u32::try_from(p).unwrap_or(1)),
        products,
    }
}

// =============================================================================
// Orders
// =============================================================================

fn order_status(value: Option<&Value>) -> OrderStatus {
    value
        .and_then(Value::as_str)
        .map_or(OrderStatus::Pending, |s| {
            match s.to_ascii_lowercase().as_str() {
                "processing" => OrderStatus::Processing,
                "shipped" => OrderStatus::Shipped,
                "delivered" => OrderStatus::Delivered,
                "cancelled" | "canceled" => OrderStatus::Cancelled,
                _ => OrderStatus::Pending,
            }
        })
}

fn payment_method(value: Option<&Value>) -> Option<PaymentMethod> {
    match value?.as_str()? {
        "card" => Some(PaymentMethod::Card),
        "paypal" => Some(PaymentMethod::Paypal),
        _ => None,
    }
}

fn shipping_method(value: Option<&Value>) -> Option<ShippingMethod> {
    match value?.as_str()? {
        "standard" => Some(ShippingMethod::Standard),
        "express" => Some(ShippingMethod::Express),
        "overnight" => Some(ShippingMethod::Overnight),
        _ => None,
    }
}

/// Normalize an order summary object.
#[must_use]
pub fn order_summary(payload: &Value) -> Option<OrderSummary> {
    if !payload.is_object() {
        return None;
    }
    let amount = |key: &str| payload.get(key).map_or(Decimal::ZERO, lenient_decimal);
    Some(OrderSummary {
        subtotal: amount("subtotal"),
        shipping: amount("shipping"),
        tax: amount("tax"),
        total: amount("total"),
    })
}

fn order_line(row: &Value) -> Option<OrderLine> {
    let id = entity_id(row).or_else(|| first_str(row, &["productId"]))?;
    Some(OrderLine {
        product_id: ProductId::new(id),
        title: first_str(row, &["title", "name"]).unwrap_or_else(|| "Unknown Product".into()),
        price: row.get("price").map_or(Decimal::ZERO, lenient_decimal),
        quantity: row.get("quantity").map_or(1, |q| lenient_quantity(q)),
        image: image_of(row),
    })
}

/// Normalize one order payload. `None` if it carries no identity.
#[must_use]
pub fn order(payload: &Value) -> Option<Order> {
    let id = entity_id(payload)?;

    let items = payload
        .get("items")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(order_line).collect())
        .unwrap_or_default();

    let customer_name = lookup_path(payload, "shippingAddress.fullName")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .or_else(|| lookup_path(payload, "customerInfo.fullName")
            .and_then(Value::as_str)
            .map(ToString::to_string));

    Some(Order {
        id: OrderId::new(id),
        status: order_status(payload.get("status")),
        customer_name,
        items,
        summary: payload.get("summary").and_then(order_summary),
        payment_method: payment_method(payload.get("paymentMethod")),
        shipping_method: shipping_method(payload.get("shippingMethod")),
        user_id: payload
            .get("user")
            .and_then(entity_id)
            .or_else(|| first_str(payload, &["userId"]))
            .map(UserId::new),
        created_at: datetime(payload.get("createdAt")),
    })
}

/// Normalize an order listing (`orders`, `data`, or a bare array).
#[must_use]
pub fn orders(payload: &Value) -> Vec<Order> {
    unwrap_list(payload, &["orders", "data"])
        .map(|rows| rows.iter().filter_map(order).collect())
        .unwrap_or_default()
}

// =============================================================================
// Users & auth
// =============================================================================

/// Normalize one user payload. `None` if it carries no identity.
#[must_use]
pub fn user(payload: &Value) -> Option<User> {
    let id = entity_id(payload)?;

    let role = match payload.get("role").and_then(Value::as_str) {
        Some("admin") => Some(UserRole::Admin),
        Some("customer") => Some(UserRole::Customer),
        // Unknown or absent roles stay absent; absent is never admin.
        _ => None,
    };

    Some(User {
        id: UserId::new(id),
        name: first_str(payload, &["name"]).unwrap_or_default(),
        email: first_str(payload, &["email"]).unwrap_or_default(),
        role,
    })
}

/// Normalize a user listing (`users`, `data`, or a bare array).
#[must_use]
pub fn users(payload: &Value) -> Vec<User> {
    unwrap_list(payload, &["users", "data"])
        .map(|rows| rows.iter().filter_map(user).collect())
        .unwrap_or_default()
}

/// Normalize a login/register response: `{token, user}`.
#[must_use]
pub fn auth_grant(payload: &Value) -> Option<AuthGrant> {
    let token = first_str(payload, &["token"])?;
    let user = payload.get("user").and_then(user)?;
    Some(AuthGrant { token, user })
}

// =============================================================================
// Payments
// =============================================================================

/// Normalize a payment intent payload.
#[must_use]
pub fn payment_intent(payload: &Value) -> Option<PaymentIntent> {
    let id = entity_id(payload).or_else(|| first_str(payload, &["paymentIntentId"]))?;
    Some(PaymentIntent {
        id: PaymentIntentId::new(id),
        status: first_str(payload, &["status"]).unwrap_or_else(|| "unknown".into()),
        amount_cents: payload.get("amount").and_then(lenient_i64).unwrap_or(0),
        client_secret: first_str(payload, &["clientSecret"]),
    })
}

/// Normalize a payment transaction payload.
#[must_use]
pub fn payment_receipt(payload: &Value) -> Option<PaymentReceipt> {
    let id = first_str(payload, &["transactionId"]).or_else(|| entity_id(payload))?;
    Some(PaymentReceipt {
        transaction_id: TransactionId::new(id),
        status: first_str(payload, &["status"]).unwrap_or_else(|| "unknown".into()),
        amount_cents: payload.get("amount").and_then(lenient_i64).unwrap_or(0),
    })
}

/// Normalize a payment history listing.
#[must_use]
pub fn payment_receipts(payload: &Value) -> Vec<PaymentReceipt> {
    unwrap_list(payload, &["transactions", "payments", "data"])
        .map(|rows| rows.iter().filter_map(payment_receipt).collect())
        .unwrap_or_default()
}

// =============================================================================
// Shipping
// =============================================================================

/// Normalize one carrier rate.
#[must_use]
pub fn shipping_rate(payload: &Value) -> Option<ShippingRate> {
    let amount = payload.get("rate").or_else(|| payload.get("amount"))?;
    Some(ShippingRate {
        carrier_name: first_str(payload, &["carrierName", "carrier"]).unwrap_or_default(),
        service_name: first_str(payload, &["serviceName", "service"]).unwrap_or_default(),
        amount: lenient_decimal(amount),
        estimated_days: payload
            .get("estimatedDeliveryDays")
            .and_then(lenient_i64)
            .map_or(0, |d| u32::try_from(d).unwrap_or(0)),
        estimated_delivery: datetime(payload.get("estimatedDeliveryDate")),
    })
}

/// Normalize a rate-calculation response (`rates` or a bare array).
#[must_use]
pub fn shipping_rates(payload: &Value) -> Vec<ShippingRate> {
    unwrap_list(payload, &["rates", "data"])
        .map(|rows| rows.iter().filter_map(shipping_rate).collect())
        .unwrap_or_default()
}

/// Normalize a shipping label payload.
#[must_use]
pub fn shipping_label(payload: &Value) -> Option<ShippingLabel> {
    let id = first_str(payload, &["shipmentId"]).or_else(|| entity_id(payload))?;
    Some(ShippingLabel {
        shipment_id: ShipmentId::new(id),
        order_id: OrderId::new(first_str(payload, &["orderId"]).unwrap_or_default()),
        tracking_number: first_str(payload, &["trackingNumber"]).unwrap_or_default(),
        label_url: first_str(payload, &["labelUrl"]),
    })
}

/// Normalize a shipments-for-order listing.
#[must_use]
pub fn shipping_labels(payload: &Value) -> Vec<ShippingLabel> {
    unwrap_list(payload, &["shipments", "labels", "data"])
        .map(|rows| rows.iter().filter_map(shipping_label).collect())
        .unwrap_or_default()
}

/// Normalize a tracking response.
#[must_use]
pub fn tracking_info(payload: &Value) -> Option<TrackingInfo> {
    Some(TrackingInfo {
        tracking_number: first_str(payload, &["trackingNumber"])?,
        status: first_str(payload, &["status"]).unwrap_or_else(|| "unknown".into()),
        estimated_delivery: datetime(payload.get("estimatedDelivery")),
    })
}

//! HTTP implementation of the [`Gateway`] trait.
//!
//! JSON over HTTP with `reqwest`. A bearer token is attached to every
//! request once installed via [`Gateway::set_auth_token`]. Product reads
//! are cached with `moka` (5-minute TTL) and invalidated on mutation; cart,
//! order, auth, payment and shipping calls are never cached. No client-side
//! timeout is configured - a call resolves or rejects per the transport.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, error, instrument};

use coralcart_core::{OrderId, OrderStatus, PaymentProcessor, ProductId, UserId, to_cents};

use super::wire;
use super::{
    ApiError, AuthGrant, CardDetails, CartItem, Credentials, Destination, Gateway, Order,
    OrderDraft, PackageInfo, PaymentIntent, PaymentIntentRequest, PaymentReceipt, PaymentRequest,
    Product, ProductDraft, ProductFilters, ProductPage, Registration, ShippingLabel, ShippingRate,
    TrackingInfo, User,
};
use crate::config::StorefrontConfig;

const PRODUCT_CACHE_CAPACITY: u64 = 1000;
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(300);

/// HTTP client for the remote commerce gateway.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<HttpGatewayInner>,
}

struct HttpGatewayInner {
    client: reqwest::Client,
    base_url: String,
    token: Mutex<Option<SecretString>>,
    products: Cache<String, Product>,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.inner.base_url)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    /// Create a gateway client from configuration.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        let products = Cache::builder()
            .max_capacity(PRODUCT_CACHE_CAPACITY)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(HttpGatewayInner {
                client: reqwest::Client::new(),
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                token: Mutex::new(None),
                products,
            }),
        }
    }

    fn current_token(&self) -> Option<SecretString> {
        self.inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute one request and return the parsed JSON body.
    ///
    /// An empty body (204-style responses) parses as `Value::Null`.
    #[instrument(skip(self, body, query), fields(path = %path))]
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Option<&[(String, String)]>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}/{path}", self.inner.base_url);
        let mut request = self.inner.client.request(method, &url);

        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(token) = self.current_token() {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(truncate(&text)));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized(truncate(&text)));
        }
        if !status.is_success() {
            error!(
                status = %status,
                body = %truncate(&text),
                "gateway returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }

        if text.trim().is_empty() {
            debug!("gateway returned an empty body");
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|parse_error| {
            error!(
                error = %parse_error,
                body = %truncate(&text),
                "failed to parse gateway response"
            );
            ApiError::Parse(parse_error)
        })
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send(Method::GET, path, None, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(Method::POST, path, Some(body), None).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(Method::PUT, path, Some(body), None).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.send(Method::DELETE, path, None, None).await
    }
}

/// Truncate a response body for error messages and logs.
fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Translate product filters into the gateway's query parameters.
///
/// Price bounds are converted to integer cents (the backend convention);
/// the `all` category sentinel means "no category filter".
fn filter_query(filters: &ProductFilters) -> Vec<(String, String)> {
    let mut query = Vec::new();
    if let Some(category) = &filters.category
        && category != "all"
    {
        query.push(("category".to_string(), category.clone()));
    }
    if let Some(min) = filters.min_price {
        query.push(("minPrice".to_string(), to_cents(min).to_string()));
    }
    if let Some(max) = filters.max_price {
        query.push(("maxPrice".to_string(), to_cents(max).to_string()));
    }
    if let Some(is_active) = filters.is_active {
        query.push(("isActive".to_string(), is_active.to_string()));
    }
    if let Some(search) = &filters.search {
        query.push(("search".to_string(), search.clone()));
    }
    query.push(("page".to_string(), filters.page.to_string()));
    query.push(("limit".to_string(), filters.limit.to_string()));
    query
}

fn product_body(draft: &ProductDraft) -> Value {
    json!({
        "title": draft.title,
        "description": draft.description,
        "price": draft.price,
        "images": draft.images,
        "category": draft.categories,
        "stock": draft.stock,
        "isActive": draft.is_active,
    })
}

fn address_body(address: &super::Address, full_name: &str, phone: Option<&str>) -> Value {
    json!({
        "fullName": full_name,
        "line1": address.line1,
        "line2": address.line2.clone().unwrap_or_default(),
        "city": address.city,
        "state": address.state,
        "postalCode": address.postal_code,
        "country": address.country,
        "phone": phone,
    })
}

fn order_body(draft: &OrderDraft) -> Value {
    let full_name = draft.customer.full_name();
    let phone = draft.customer.phone.as_deref();
    let shipping_address = address_body(&draft.customer.address, &full_name, phone);
    // "Same as shipping" submits the shipping address twice.
    let billing_address = draft
        .customer
        .billing_address
        .as_ref()
        .map_or_else(|| shipping_address.clone(), |b| address_body(b, &full_name, phone));

    json!({
        "customerInfo": {
            "firstName": draft.customer.first_name,
            "lastName": draft.customer.last_name,
            "email": draft.customer.email,
            "phone": phone,
        },
        "shippingAddress": shipping_address,
        "billingAddress": billing_address,
        "items": draft
            .items
            .iter()
            .map(|line| {
                json!({
                    "id": line.product_id,
                    "name": line.title,
                    "price": line.price,
                    "quantity": line.quantity,
                    "image": line.image,
                })
            })
            .collect::<Vec<_>>(),
        "summary": {
            "subtotal": draft.summary.subtotal,
            "shipping": draft.summary.shipping,
            "tax": draft.summary.tax,
            "total": draft.summary.total,
        },
        "paymentMethod": draft.payment_method.as_str(),
        "shippingMethod": draft.shipping_method.as_str(),
    })
}

/// Card data in the processor's expected shape.
fn card_body(card: &CardDetails) -> Value {
    let digits: String = card.number.chars().filter(char::is_ascii_digit).collect();
    let (month, year) = card
        .expiry
        .split_once('/')
        .map_or((0, 0), |(m, y)| {
            let month = m.trim().parse::<u32>().unwrap_or(0);
            let year = y.trim().parse::<u32>().unwrap_or(0);
            (month, 2000 + year)
        });
    json!({
        "type": "card",
        "card": {
            "number": digits,
            "exp_month": month,
            "exp_year": year,
            "cvc": card.cvv,
        },
        "billing_details": {
            "name": card.holder_name,
        },
    })
}

fn package_body(package: &PackageInfo) -> Value {
    json!({
        "weight": package.weight_lbs,
        "dimensions": {
            "length": package.length_in,
            "width": package.width_in,
            "height": package.height_in,
        },
    })
}

impl Gateway for HttpGateway {
    // -- Products -----------------------------------------------------------

    async fn list_products(&self, filters: &ProductFilters) -> Result<ProductPage, ApiError> {
        let query = filter_query(filters);
        let payload = self
            .send(Method::GET, "products", None, Some(&query))
            .await?;
        Ok(wire::product_page(&payload))
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        if let Some(product) = self.inner.products.get(id.as_str()).await {
            debug!(product_id = %id, "cache hit for product");
            return Ok(product);
        }

        let payload = self.get(&format!("products/{id}")).await?;
        let product = wire::product(&payload)
            .ok_or_else(|| ApiError::Malformed(format!("product {id} has no identity")))?;

        self.inner
            .products
            .insert(id.as_str().to_string(), product.clone())
            .await;

        Ok(product)
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        let payload = self.post("products", &product_body(draft)).await?;
        wire::product(&payload)
            .ok_or_else(|| ApiError::Malformed("created product has no identity".to_string()))
    }

    async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let payload = self
            .put(&format!("products/{id}"), &product_body(draft))
            .await?;
        self.inner.products.invalidate(id.as_str()).await;
        wire::product(&payload)
            .ok_or_else(|| ApiError::Malformed(format!("updated product {id} has no identity")))
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        self.delete(&format!("products/{id}")).await?;
        self.inner.products.invalidate(id.as_str()).await;
        Ok(())
    }

    // -- Cart ---------------------------------------------------------------

    async fn get_cart(&self) -> Result<Vec<CartItem>, ApiError> {
        let payload = self.get("cart").await?;
        Ok(wire::cart_items(&payload))
    }

    async fn add_to_cart(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        // The backend expects the nested-product shape on add.
        let body = json!({"product": {"_id": product_id}, "quantity": quantity});
        self.post("cart", &body).await?;
        Ok(())
    }

    async fn update_cart_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let body = json!({"quantity": quantity});
        self.put(&format!("cart/{product_id}"), &body).await?;
        Ok(())
    }

    async fn remove_from_cart(&self, product_id: &ProductId) -> Result<(), ApiError> {
        self.delete(&format!("cart/{product_id}")).await?;
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        self.delete("cart").await?;
        Ok(())
    }

    // -- Orders -------------------------------------------------------------

    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, ApiError> {
        let payload = self.post("orders", &order_body(draft)).await?;
        wire::order(&payload)
            .ok_or_else(|| ApiError::Malformed("created order has no identity".to_string()))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let payload = self.get("orders").await?;
        Ok(wire::orders(&payload))
    }

    async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        let payload = self.get("orders/myOrders").await?;
        Ok(wire::orders(&payload))
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let payload = self.get(&format!("orders/{id}")).await?;
        wire::order(&payload)
            .ok_or_else(|| ApiError::Malformed(format!("order {id} has no identity")))
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let body = json!({"status": status});
        let payload = self.put(&format!("orders/{id}"), &body).await?;
        wire::order(&payload)
            .ok_or_else(|| ApiError::Malformed(format!("order {id} has no identity")))
    }

    // -- Users & auth -------------------------------------------------------

    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
        let body = json!({"email": credentials.email, "password": credentials.password});
        let payload = self.post("users/login", &body).await?;
        wire::auth_grant(&payload)
            .ok_or_else(|| ApiError::Malformed("login response missing token or user".to_string()))
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant, ApiError> {
        let body = json!({
            "name": registration.name,
            "email": registration.email,
            "password": registration.password,
        });
        let payload = self.post("users", &body).await?;
        wire::auth_grant(&payload).ok_or_else(|| {
            ApiError::Malformed("register response missing token or user".to_string())
        })
    }

    async fn get_user(&self, id: &UserId) -> Result<User, ApiError> {
        let payload = self.get(&format!("users/{id}")).await?;
        wire::user(&payload).ok_or_else(|| ApiError::Malformed(format!("user {id} has no identity")))
    }

    async fn update_user(
        &self,
        id: &UserId,
        name: &str,
        role: Option<&str>,
    ) -> Result<User, ApiError> {
        let body = json!({"name": name, "role": role});
        let payload = self.put(&format!("users/{id}"), &body).await?;
        wire::user(&payload).ok_or_else(|| ApiError::Malformed(format!("user {id} has no identity")))
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), ApiError> {
        self.delete(&format!("users/{id}")).await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let payload = self.get("users").await?;
        Ok(wire::users(&payload))
    }

    // -- Payments -----------------------------------------------------------

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError> {
        let body = json!({
            "amount": request.amount_cents,
            "currency": request.currency,
            "orderId": request.order_id,
        });
        let payload = self.post("payments/intents", &body).await?;
        wire::payment_intent(&payload)
            .ok_or_else(|| ApiError::Malformed("payment intent has no identity".to_string()))
    }

    async fn confirm_payment_intent(
        &self,
        intent_id: &str,
        card: &CardDetails,
        processor: PaymentProcessor,
    ) -> Result<PaymentReceipt, ApiError> {
        let body = json!({
            "paymentIntentId": intent_id,
            "paymentMethodData": card_body(card),
            "processor": processor,
        });
        let payload = self
            .post(&format!("payments/intents/{intent_id}/confirm"), &body)
            .await?;
        wire::payment_receipt(&payload)
            .ok_or_else(|| ApiError::Malformed("confirmation has no transaction id".to_string()))
    }

    async fn get_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, ApiError> {
        let payload = self.get(&format!("payments/intents/{intent_id}")).await?;
        wire::payment_intent(&payload)
            .ok_or_else(|| ApiError::Malformed(format!("payment intent {intent_id} not parseable")))
    }

    async fn process_payment(&self, request: &PaymentRequest) -> Result<PaymentReceipt, ApiError> {
        let body = json!({
            "amount": request.amount_cents,
            "orderId": request.order_id,
            "processor": request.processor,
            "paymentMethodData": card_body(&request.card),
        });
        let payload = self.post("payments/process", &body).await?;
        wire::payment_receipt(&payload)
            .ok_or_else(|| ApiError::Malformed("payment has no transaction id".to_string()))
    }

    async fn refund_payment(
        &self,
        transaction_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> Result<PaymentReceipt, ApiError> {
        let body = json!({
            "transactionId": transaction_id,
            "amount": to_cents(amount),
            "reason": reason,
        });
        let payload = self.post("payments/refund", &body).await?;
        wire::payment_receipt(&payload)
            .ok_or_else(|| ApiError::Malformed("refund has no transaction id".to_string()))
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<PaymentReceipt, ApiError> {
        let payload = self.get(&format!("payments/{transaction_id}")).await?;
        wire::payment_receipt(&payload)
            .ok_or_else(|| ApiError::Malformed(format!("transaction {transaction_id} not parseable")))
    }

    async fn payment_history(&self) -> Result<Vec<PaymentReceipt>, ApiError> {
        let payload = self.get("payments/history").await?;
        Ok(wire::payment_receipts(&payload))
    }

    // -- Shipping -----------------------------------------------------------

    async fn shipping_rates(
        &self,
        package: &PackageInfo,
        destination: &Destination,
    ) -> Result<Vec<ShippingRate>, ApiError> {
        let body = json!({
            "packageInfo": package_body(package),
            "destination": {
                "country": destination.country,
                "state": destination.state,
                "city": destination.city,
                "postalCode": destination.postal_code,
            },
        });
        let payload = self.post("shipping/rates", &body).await?;
        Ok(wire::shipping_rates(&payload))
    }

    async fn create_shipping_label(
        &self,
        order_id: &OrderId,
        rate: &ShippingRate,
        package: &PackageInfo,
    ) -> Result<ShippingLabel, ApiError> {
        let body = json!({
            "orderId": order_id,
            "selectedRate": {
                "carrierName": rate.carrier_name,
                "serviceName": rate.service_name,
                "rate": rate.amount,
            },
            "packageInfo": package_body(package),
        });
        let payload = self.post("shipping/labels", &body).await?;
        wire::shipping_label(&payload)
            .ok_or_else(|| ApiError::Malformed("label has no shipment id".to_string()))
    }

    async fn track_shipment(&self, tracking_number: &str) -> Result<TrackingInfo, ApiError> {
        let payload = self.get(&format!("shipping/track/{tracking_number}")).await?;
        wire::tracking_info(&payload)
            .ok_or_else(|| ApiError::Malformed("tracking response missing number".to_string()))
    }

    async fn order_shipping(&self, order_id: &OrderId) -> Result<Vec<ShippingLabel>, ApiError> {
        let payload = self.get(&format!("shipping/orders/{order_id}")).await?;
        Ok(wire::shipping_labels(&payload))
    }

    async fn cancel_shipment(&self, shipment_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("shipping/shipments/{shipment_id}"))
            .await?;
        Ok(())
    }

    // -- Session ------------------------------------------------------------

    fn set_auth_token(&self, token: Option<SecretString>) {
        *self
            .inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }
}

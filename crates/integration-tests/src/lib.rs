//! Integration tests for CoralCart.
//!
//! The SDK is exercised end to end against an in-process stub of the
//! remote commerce gateway: an axum server bound to an ephemeral port,
//! with in-memory state the tests can inspect and failure toggles for the
//! degradation paths. Every test talks real HTTP through the production
//! `HttpGateway`, so wire normalization, auth headers and status mapping
//! are covered, not just the engines.
//!
//! # Test Categories
//!
//! - `cart_flow` - server cart round trips, payload-shape normalization,
//!   fallback-to-local behavior
//! - `checkout_flow` - order placement, partial payment failure, submit
//!   validation
//! - `admin_flow` - role gating and console CRUD

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use coralcart_storefront::config::StorefrontConfig;

/// The bearer token the stub accepts and hands out.
pub const STUB_TOKEN: &str = "stub-token";

/// Which payload shape the stub's `GET /cart` answers with. The client
/// must normalize all of them identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartShape {
    /// `{"items": [...]}` with flat rows.
    Items,
    /// `{"cart": {"items": [...]}}` with nested product references.
    NestedCart,
    /// A bare JSON array of flat rows.
    Bare,
    /// `{"data": [...]}` with flat rows.
    Data,
}

/// One server-side cart row.
#[derive(Debug, Clone)]
pub struct CartRow {
    pub product_id: String,
    pub quantity: u32,
}

/// Mutable stub state, shared with the running server.
#[derive(Debug)]
pub struct StubState {
    pub products: Vec<Value>,
    pub cart: Vec<CartRow>,
    pub orders: Vec<Value>,
    pub users: Vec<Value>,
    pub rates: Vec<Value>,
    pub cart_shape: CartShape,
    /// All cart endpoints answer 502 while set.
    pub fail_cart: bool,
    /// `POST /payments/process` answers 502 while set.
    pub fail_payments: bool,
    order_counter: usize,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            cart: Vec::new(),
            orders: Vec::new(),
            users: Vec::new(),
            rates: Vec::new(),
            cart_shape: CartShape::Items,
            fail_cart: false,
            fail_payments: false,
            order_counter: 0,
        }
    }
}

impl StubState {
    /// A product row in the backend's wire shape.
    #[must_use]
    pub fn product(id: &str, title: &str, price: f64, category: &str) -> Value {
        json!({
            "_id": id,
            "title": title,
            "price": price,
            "category": category,
            "image": [format!("{id}.jpg")],
            "stock": 100,
            "isActive": true,
        })
    }

    /// A user row in the backend's wire shape.
    #[must_use]
    pub fn user(id: &str, name: &str, email: &str, role: Option<&str>) -> Value {
        let mut user = json!({"_id": id, "name": name, "email": email});
        if let Some(role) = role {
            user["role"] = json!(role);
        }
        user
    }

    fn find_product(&self, id: &str) -> Option<&Value> {
        self.products
            .iter()
            .find(|p| p.get("_id").and_then(Value::as_str) == Some(id))
    }

    fn cart_payload(&self) -> Value {
        let rows: Vec<Value> = self
            .cart
            .iter()
            .map(|row| {
                let product = self.find_product(&row.product_id).cloned().unwrap_or_else(
                    || json!({"_id": row.product_id, "title": "Unknown", "price": 0}),
                );
                match self.cart_shape {
                    CartShape::NestedCart => {
                        json!({"quantity": row.quantity, "product": product})
                    }
                    _ => {
                        let mut flat = product;
                        flat["quantity"] = json!(row.quantity);
                        flat
                    }
                }
            })
            .collect();

        match self.cart_shape {
            CartShape::Items => json!({"items": rows}),
            CartShape::NestedCart => json!({"cart": {"items": rows}}),
            CartShape::Bare => json!(rows),
            CartShape::Data => json!({"data": rows}),
        }
    }
}

type Shared = Arc<Mutex<StubState>>;

/// A running stub gateway.
pub struct StubServer {
    /// Base URL for `CORALCART_API_URL`-style configuration.
    pub base_url: String,
    state: Shared,
}

impl StubServer {
    /// Lock the stub state for seeding or assertions.
    pub fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A storefront configuration pointing at this stub, with a fresh
    /// data directory.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig {
            api_base_url: self.base_url.parse().unwrap(),
            data_dir: temp_dir(),
            prefer_server_cart: true,
        }
    }
}

/// A fresh, created temp directory for a test profile.
#[must_use]
pub fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("coralcart-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Spawn the stub gateway on an ephemeral port.
pub async fn spawn(state: StubState) -> StubServer {
    let shared: Shared = Arc::new(Mutex::new(state));

    let api = Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/{id}", put(update_cart_item).delete(remove_cart_item))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/myOrders", get(list_orders))
        .route("/orders/{id}", get(get_order).put(update_order))
        .route("/users", get(list_users).post(register))
        .route("/users/login", post(login))
        .route("/users/{id}", put(update_user).delete(delete_user))
        .route("/payments/process", post(process_payment))
        .route("/shipping/rates", post(shipping_rates))
        .route("/shipping/labels", post(shipping_label))
        .route("/shipping/track/{tn}", get(track_shipment))
        .with_state(Arc::clone(&shared));

    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub listener addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    StubServer {
        base_url: format!("http://{addr}/api"),
        state: shared,
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, StubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {STUB_TOKEN}"))
}

fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
}

// -- Products ----------------------------------------------------------------

async fn list_products(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let state = lock(&state);
    let mut products: Vec<Value> = state.products.clone();

    if let Some(category) = params.get("category") {
        products.retain(|p| {
            p.get("category")
                .map(|c| match c {
                    Value::String(s) => s == category,
                    Value::Array(list) => list.iter().any(|v| v.as_str() == Some(category)),
                    _ => false,
                })
                .unwrap_or(false)
        });
    }
    if let Some(search) = params.get("search") {
        let needle = search.to_lowercase();
        products.retain(|p| {
            p.get("title")
                .and_then(Value::as_str)
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        });
    }

    let total = products.len();
    let limit: usize = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(12);
    let page: usize = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);
    let pages = total.div_ceil(limit.max(1)).max(1);
    let paged: Vec<Value> = products
        .into_iter()
        .skip(page.saturating_sub(1) * limit)
        .take(limit)
        .collect();

    Json(json!({
        "products": paged,
        "total": total,
        "page": page,
        "pages": pages,
    }))
    .into_response()
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = lock(&state);
    state.find_product(&id).map_or_else(
        || (StatusCode::NOT_FOUND, "no such product").into_response(),
        |product| Json(product.clone()).into_response(),
    )
}

async fn create_product(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let id = format!("p-{}", state.products.len() + 1);
    body["_id"] = json!(id);
    state.products.push(body.clone());
    Json(body).into_response()
}

async fn update_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    let Some(product) = state
        .products
        .iter_mut()
        .find(|p| p.get("_id").and_then(Value::as_str) == Some(id.as_str()))
    else {
        return (StatusCode::NOT_FOUND, "no such product").into_response();
    };
    if let (Value::Object(target), Value::Object(patch)) = (&mut *product, &body) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(product.clone()).into_response()
}

async fn delete_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = lock(&state);
    state
        .products
        .retain(|p| p.get("_id").and_then(Value::as_str) != Some(id.as_str()));
    StatusCode::NO_CONTENT.into_response()
}

// -- Cart --------------------------------------------------------------------

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    let state = lock(&state);
    if state.fail_cart {
        return bad_gateway();
    }
    Json(state.cart_payload()).into_response()
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    let mut state = lock(&state);
    if state.fail_cart {
        return bad_gateway();
    }

    // The backend's add shape: {"product": {"_id": ...}, "quantity": n}
    let Some(product_id) = body
        .get("product")
        .and_then(|p| p.get("_id"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
    else {
        return (StatusCode::BAD_REQUEST, "missing product id").into_response();
    };
    let quantity = body.get("quantity").and_then(Value::as_u64).unwrap_or(1) as u32;

    if let Some(row) = state.cart.iter_mut().find(|r| r.product_id == product_id) {
        row.quantity += quantity;
    } else {
        state.cart.push(CartRow {
            product_id,
            quantity,
        });
    }
    Json(state.cart_payload()).into_response()
}

async fn update_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    let mut state = lock(&state);
    if state.fail_cart {
        return bad_gateway();
    }
    let quantity = body.get("quantity").and_then(Value::as_u64).unwrap_or(1) as u32;
    let Some(row) = state.cart.iter_mut().find(|r| r.product_id == id) else {
        return (StatusCode::NOT_FOUND, "not in cart").into_response();
    };
    row.quantity = quantity;
    Json(state.cart_payload()).into_response()
}

async fn remove_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    let mut state = lock(&state);
    if state.fail_cart {
        return bad_gateway();
    }
    state.cart.retain(|r| r.product_id != id);
    Json(state.cart_payload()).into_response()
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    let mut state = lock(&state);
    if state.fail_cart {
        return bad_gateway();
    }
    state.cart.clear();
    StatusCode::NO_CONTENT.into_response()
}

// -- Orders ------------------------------------------------------------------

async fn create_order(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let mut state = lock(&state);
    state.order_counter += 1;
    let id = format!("order-{}", state.order_counter);
    body["_id"] = json!(id);
    body["status"] = json!("pending");
    state.orders.push(body.clone());
    Json(body).into_response()
}

async fn list_orders(State(state): State<Shared>) -> Response {
    let state = lock(&state);
    Json(json!({"orders": state.orders})).into_response()
}

async fn get_order(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = lock(&state);
    state
        .orders
        .iter()
        .find(|o| o.get("_id").and_then(Value::as_str) == Some(id.as_str()))
        .map_or_else(
            || (StatusCode::NOT_FOUND, "no such order").into_response(),
            |order| Json(order.clone()).into_response(),
        )
}

async fn update_order(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    let Some(order) = state
        .orders
        .iter_mut()
        .find(|o| o.get("_id").and_then(Value::as_str) == Some(id.as_str()))
    else {
        return (StatusCode::NOT_FOUND, "no such order").into_response();
    };
    if let Some(status) = body.get("status") {
        order["status"] = status.clone();
    }
    Json(order.clone()).into_response()
}

// -- Users & auth ------------------------------------------------------------

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let state = lock(&state);
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let user = state
        .users
        .iter()
        .find(|u| u.get("email").and_then(Value::as_str) == Some(email))
        .cloned()
        .unwrap_or_else(|| StubState::user("u-guest", "Guest", email, None));
    Json(json!({"token": STUB_TOKEN, "user": user})).into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let id = format!("u-{}", state.users.len() + 1);
    let user = json!({
        "_id": id,
        "name": body.get("name").cloned().unwrap_or_default(),
        "email": body.get("email").cloned().unwrap_or_default(),
        "role": "customer",
    });
    state.users.push(user.clone());
    Json(json!({"token": STUB_TOKEN, "user": user})).into_response()
}

async fn list_users(State(state): State<Shared>) -> Response {
    let state = lock(&state);
    Json(json!(state.users)).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    let Some(user) = state
        .users
        .iter_mut()
        .find(|u| u.get("_id").and_then(Value::as_str) == Some(id.as_str()))
    else {
        return (StatusCode::NOT_FOUND, "no such user").into_response();
    };
    if let Some(name) = body.get("name") {
        user["name"] = name.clone();
    }
    if let Some(role) = body.get("role").filter(|r| !r.is_null()) {
        user["role"] = role.clone();
    }
    Json(user.clone()).into_response()
}

async fn delete_user(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = lock(&state);
    state
        .users
        .retain(|u| u.get("_id").and_then(Value::as_str) != Some(id.as_str()));
    StatusCode::NO_CONTENT.into_response()
}

// -- Payments & shipping -----------------------------------------------------

async fn process_payment(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let state = lock(&state);
    if state.fail_payments {
        return bad_gateway();
    }
    Json(json!({
        "transactionId": "txn-1",
        "status": "succeeded",
        "amount": body.get("amount").cloned().unwrap_or(json!(0)),
    }))
    .into_response()
}

async fn shipping_rates(State(state): State<Shared>) -> Response {
    let state = lock(&state);
    Json(json!({"rates": state.rates})).into_response()
}

async fn shipping_label(Json(body): Json<Value>) -> Response {
    Json(json!({
        "shipmentId": "ship-1",
        "orderId": body.get("orderId").cloned().unwrap_or_default(),
        "trackingNumber": "TRK-0001",
    }))
    .into_response()
}

async fn track_shipment(Path(tn): Path<String>) -> Response {
    Json(json!({"trackingNumber": tn, "status": "in_transit"})).into_response()
}

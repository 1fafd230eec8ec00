//! Shared unit-test support: an in-memory [`Gateway`] and fixtures.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rust_decimal::Decimal;
use secrecy::SecretString;

use coralcart_core::{OrderId, OrderStatus, PaymentProcessor, ProductId, UserId, UserRole};

use crate::auth::Session;
use crate::gateway::{
    ApiError, AuthGrant, CardDetails, CartItem, Credentials, Destination, Gateway, Order,
    OrderDraft, PackageInfo, PaymentIntent, PaymentIntentRequest, PaymentReceipt, PaymentRequest,
    Product, ProductDraft, ProductFilters, ProductPage, Registration, ShippingLabel, ShippingRate,
    TrackingInfo, User,
};
use crate::storage::LocalStore;

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh, created temp directory unique to this process and call.
pub(crate) fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "coralcart-test-{}-{}",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
    ));
    std::fs::create_dir_all(&dir).unwrap_or_else(|_| panic!("cannot create {}", dir.display()));
    dir
}

pub(crate) fn temp_store() -> LocalStore {
    LocalStore::open(temp_dir()).unwrap()
}

/// A product fixture with the given id, title and decimal price.
pub(crate) fn sample_product(id: &str, title: &str, price: &str) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        description: None,
        price: price.parse().unwrap_or(Decimal::ZERO),
        images: vec![format!("{id}.jpg")],
        categories: vec!["general".to_string()],
        stock: 100,
        is_active: true,
        created_at: None,
    }
}

pub(crate) fn sample_user(id: &str, role: Option<UserRole>) -> User {
    User {
        id: UserId::new(id),
        name: "Sam Tester".to_string(),
        email: "sam@example.com".to_string(),
        role,
    }
}

/// A session carrying a token, as produced by a successful login.
pub(crate) fn authenticated_session() -> Session {
    Session::authenticated(
        sample_user("u1", Some(UserRole::Customer)),
        SecretString::from("test-token"),
    )
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
}

/// In-memory gateway with failure toggles and call counters.
///
/// Server cart semantics mirror the backend: adds merge by product id and
/// denormalize display fields from the seeded product list.
#[derive(Default)]
pub(crate) struct FakeGateway {
    products: Mutex<Vec<Product>>,
    cart: Mutex<Vec<CartItem>>,
    orders: Mutex<Vec<Order>>,
    users: Mutex<Vec<User>>,
    rates: Mutex<Vec<ShippingRate>>,
    fail_cart: AtomicBool,
    fail_mutations: AtomicBool,
    fail_payments: AtomicBool,
    fail_orders: AtomicBool,
    fail_shipping: AtomicBool,
    fail_products: AtomicBool,
    create_order_calls: AtomicUsize,
    process_payment_calls: AtomicUsize,
    login_calls: AtomicUsize,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seed_product(&self, product: Product) {
        self.lock_products().push(product);
    }

    pub(crate) fn seed_rates(&self, rates: Vec<ShippingRate>) {
        *self.lock(&self.rates) = rates;
    }

    pub(crate) fn fail_cart(&self, fail: bool) {
        self.fail_cart.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_cart_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_payments(&self, fail: bool) {
        self.fail_payments.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_shipping(&self, fail: bool) {
        self.fail_shipping.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_products(&self, fail: bool) {
        self.fail_products.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn server_cart_len(&self) -> usize {
        self.lock(&self.cart).len()
    }

    pub(crate) fn create_order_calls(&self) -> usize {
        self.create_order_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn process_payment_calls(&self) -> usize {
        self.process_payment_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn orders(&self) -> Vec<Order> {
        self.lock(&self.orders).clone()
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_products(&self) -> std::sync::MutexGuard<'_, Vec<Product>> {
        self.lock(&self.products)
    }

    fn cart_endpoints_down(&self) -> bool {
        self.fail_cart.load(Ordering::SeqCst)
    }

    fn cart_mutations_down(&self) -> bool {
        self.cart_endpoints_down() || self.fail_mutations.load(Ordering::SeqCst)
    }
}

impl Gateway for FakeGateway {
    async fn list_products(&self, filters: &ProductFilters) -> Result<ProductPage, ApiError> {
        if self.fail_products.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let products: Vec<Product> = self
            .lock_products()
            .iter()
            .filter(|p| {
                filters
                    .category
                    .as_ref()
                    .is_none_or(|c| c == "all" || p.categories.contains(c))
            })
            .filter(|p| {
                filters
                    .search
                    .as_ref()
                    .is_none_or(|q| p.title.to_lowercase().contains(&q.to_lowercase()))
            })
            .cloned()
            .collect();
        let total = products.len() as u64;
        Ok(ProductPage {
            products,
            total,
            page: filters.page,
            pages: 1,
        })
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        if self.fail_products.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.lock_products()
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        let product = Product {
            id: ProductId::new(format!("p-{}", self.lock_products().len() + 1)),
            title: draft.title.clone(),
            description: draft.description.clone(),
            price: draft.price,
            images: draft.images.clone(),
            categories: draft.categories.clone(),
            stock: draft.stock,
            is_active: draft.is_active,
            created_at: None,
        };
        self.lock_products().push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let mut products = self.lock_products();
        let product = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        product.title = draft.title.clone();
        product.price = draft.price;
        product.stock = draft.stock;
        product.is_active = draft.is_active;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        self.lock_products().retain(|p| &p.id != id);
        Ok(())
    }

    async fn get_cart(&self) -> Result<Vec<CartItem>, ApiError> {
        if self.cart_endpoints_down() {
            return Err(unavailable());
        }
        Ok(self.lock(&self.cart).clone())
    }

    async fn add_to_cart(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        if self.cart_mutations_down() {
            return Err(unavailable());
        }
        let snapshot = self
            .lock_products()
            .iter()
            .find(|p| &p.id == product_id)
            .map(|p| CartItem::from_product(p, quantity))
            .ok_or_else(|| ApiError::NotFound(product_id.to_string()))?;
        let mut cart = self.lock(&self.cart);
        if let Some(existing) = cart.iter_mut().find(|i| &i.product_id == product_id) {
            existing.quantity += quantity;
        } else {
            cart.push(snapshot);
        }
        Ok(())
    }

    async fn update_cart_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        if self.cart_mutations_down() {
            return Err(unavailable());
        }
        let mut cart = self.lock(&self.cart);
        let item = cart
            .iter_mut()
            .find(|i| &i.product_id == product_id)
            .ok_or_else(|| ApiError::NotFound(product_id.to_string()))?;
        item.quantity = quantity;
        Ok(())
    }

    async fn remove_from_cart(&self, product_id: &ProductId) -> Result<(), ApiError> {
        if self.cart_mutations_down() {
            return Err(unavailable());
        }
        self.lock(&self.cart).retain(|i| &i.product_id != product_id);
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        if self.cart_mutations_down() {
            return Err(unavailable());
        }
        self.lock(&self.cart).clear();
        Ok(())
    }

    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, ApiError> {
        self.create_order_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let order = Order {
            id: OrderId::new(format!("order-{}", self.create_order_calls())),
            status: OrderStatus::Pending,
            customer_name: Some(draft.customer.full_name()),
            items: draft.items.clone(),
            summary: Some(draft.summary),
            payment_method: Some(draft.payment_method),
            shipping_method: Some(draft.shipping_method),
            user_id: None,
            created_at: None,
        };
        self.lock(&self.orders).push(order.clone());
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        Ok(self.orders())
    }

    async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        Ok(self.orders())
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.orders()
            .into_iter()
            .find(|o| &o.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let mut orders = self.lock(&self.orders);
        let order = orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        order.status = status;
        Ok(order.clone())
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AuthGrant {
            token: "test-token".to_string(),
            user: User {
                id: UserId::new("u1"),
                name: "Sam Tester".to_string(),
                email: credentials.email.to_string(),
                role: Some(UserRole::Customer),
            },
        })
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant, ApiError> {
        Ok(AuthGrant {
            token: "test-token".to_string(),
            user: User {
                id: UserId::new("u2"),
                name: registration.name.clone(),
                email: registration.email.to_string(),
                role: Some(UserRole::Customer),
            },
        })
    }

    async fn get_user(&self, id: &UserId) -> Result<User, ApiError> {
        self.lock(&self.users)
            .iter()
            .find(|u| &u.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn update_user(
        &self,
        id: &UserId,
        name: &str,
        _role: Option<&str>,
    ) -> Result<User, ApiError> {
        let mut users = self.lock(&self.users);
        let user = users
            .iter_mut()
            .find(|u| &u.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        user.name = name.to_string();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), ApiError> {
        self.lock(&self.users).retain(|u| &u.id != id);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.lock(&self.users).clone())
    }

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError> {
        if self.fail_payments.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(PaymentIntent {
            id: "pi-1".into(),
            status: "requires_confirmation".to_string(),
            amount_cents: request.amount_cents,
            client_secret: Some("secret".to_string()),
        })
    }

    async fn confirm_payment_intent(
        &self,
        intent_id: &str,
        _card: &CardDetails,
        _processor: PaymentProcessor,
    ) -> Result<PaymentReceipt, ApiError> {
        if self.fail_payments.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(PaymentReceipt {
            transaction_id: format!("txn-{intent_id}").into(),
            status: "succeeded".to_string(),
            amount_cents: 0,
        })
    }

    async fn get_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, ApiError> {
        Ok(PaymentIntent {
            id: intent_id.into(),
            status: "requires_confirmation".to_string(),
            amount_cents: 0,
            client_secret: None,
        })
    }

    async fn process_payment(&self, request: &PaymentRequest) -> Result<PaymentReceipt, ApiError> {
        self.process_payment_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_payments.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(PaymentReceipt {
            transaction_id: "txn-1".into(),
            status: "succeeded".to_string(),
            amount_cents: request.amount_cents,
        })
    }

    async fn refund_payment(
        &self,
        transaction_id: &str,
        _amount: Decimal,
        _reason: &str,
    ) -> Result<PaymentReceipt, ApiError> {
        Ok(PaymentReceipt {
            transaction_id: transaction_id.into(),
            status: "refunded".to_string(),
            amount_cents: 0,
        })
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<PaymentReceipt, ApiError> {
        Ok(PaymentReceipt {
            transaction_id: transaction_id.into(),
            status: "succeeded".to_string(),
            amount_cents: 0,
        })
    }

    async fn payment_history(&self) -> Result<Vec<PaymentReceipt>, ApiError> {
        Ok(Vec::new())
    }

    async fn shipping_rates(
        &self,
        _package: &PackageInfo,
        _destination: &Destination,
    ) -> Result<Vec<ShippingRate>, ApiError> {
        if self.fail_shipping.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.lock(&self.rates).clone())
    }

    async fn create_shipping_label(
        &self,
        order_id: &OrderId,
        _rate: &ShippingRate,
        _package: &PackageInfo,
    ) -> Result<ShippingLabel, ApiError> {
        if self.fail_shipping.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(ShippingLabel {
            shipment_id: "ship-1".into(),
            order_id: order_id.clone(),
            tracking_number: "TRACK123".to_string(),
            label_url: None,
        })
    }

    async fn track_shipment(&self, tracking_number: &str) -> Result<TrackingInfo, ApiError> {
        Ok(TrackingInfo {
            tracking_number: tracking_number.to_string(),
            status: "in_transit".to_string(),
            estimated_delivery: None,
        })
    }

    async fn order_shipping(&self, _order_id: &OrderId) -> Result<Vec<ShippingLabel>, ApiError> {
        Ok(Vec::new())
    }

    async fn cancel_shipment(&self, _shipment_id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    fn set_auth_token(&self, _token: Option<SecretString>) {}
}

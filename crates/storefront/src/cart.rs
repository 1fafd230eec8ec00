//! Cart state engine.
//!
//! The single authoritative in-memory view of the cart, reconciled with
//! exactly one backing store at a time: the server cart (authenticated
//! sessions, when configured) or the local file store (guests and
//! fallback).
//!
//! # Degradation contract
//!
//! No cart operation surfaces an error: the cart must always render
//! something rather than block the page. Every server call is individually
//! caught and degrades to local behavior, with one deliberate asymmetry:
//!
//! - a failed **load** flips the engine to local mode for the rest of the
//!   session (until re-initialized);
//! - a failed **mutation** (add/update/remove) falls back to a local
//!   mutation for that call only, leaving the mode untouched.
//!
//! The two scopes are distinct mechanisms on purpose; collapsing them into
//! one "degraded" flag changes observable behavior.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use coralcart_core::{ProductId, round_cents};

use crate::auth::Session;
use crate::gateway::{CartItem, Gateway};
use crate::storage::{LocalStore, keys};

/// Sales tax applied to the subtotal.
fn tax_rate() -> Decimal {
    Decimal::new(8, 2) // 8%
}

/// Flat shipping fee below the free-shipping threshold.
fn flat_shipping_fee() -> Decimal {
    Decimal::new(999, 2) // 9.99
}

/// Subtotals strictly above this ship free.
fn free_shipping_threshold() -> Decimal {
    Decimal::from(50)
}

/// The cart state engine. See the module docs for the degradation
/// contract.
pub struct CartService<G> {
    gateway: Arc<G>,
    store: LocalStore,
    /// Configured preference: attempt the server cart when authenticated.
    prefer_server: bool,
    /// Session-scoped mode flag; flips to `false` on a failed load and
    /// stays there until [`initialize`](Self::initialize) runs again.
    use_server: bool,
    items: Vec<CartItem>,
}

impl<G: Gateway> CartService<G> {
    /// Create the engine. Call [`initialize`](Self::initialize) to load.
    pub fn new(gateway: Arc<G>, store: LocalStore, prefer_server: bool) -> Self {
        Self {
            gateway,
            store,
            prefer_server,
            use_server: prefer_server,
            items: Vec::new(),
        }
    }

    /// Storage mode = server-backed iff configured preference holds and
    /// the session is authenticated, and no load failure has flipped the
    /// session to local.
    fn server_path(&self, session: &Session) -> bool {
        self.use_server && session.is_authenticated()
    }

    /// Reset the mode to the configured preference and load the cart.
    pub async fn initialize(&mut self, session: &Session) {
        self.use_server = self.prefer_server;
        self.load(session).await;
    }

    /// Load the cart from the active backing store.
    ///
    /// A server-side failure here permanently (for this session) flips the
    /// engine to local mode and loads from the file store instead. In
    /// local mode a missing or corrupt entry yields an empty cart, never
    /// an error.
    pub async fn load(&mut self, session: &Session) {
        if self.server_path(session) {
            match self.gateway.get_cart().await {
                Ok(items) => {
                    debug!(count = items.len(), "loaded server cart");
                    // Local storage is not written in server mode.
                    self.items = items;
                }
                Err(error) => {
                    warn!(%error, "failed to load server cart, using local storage for the rest of this session");
                    self.use_server = false;
                    self.items = self.load_from_store();
                }
            }
        } else {
            self.items = self.load_from_store();
        }
    }

    fn load_from_store(&self) -> Vec<CartItem> {
        self.store.get(keys::CART).unwrap_or_default()
    }

    /// Persist the in-memory cart to the local file.
    ///
    /// Called after every local mutation; server-path mutations are
    /// already persisted by the gateway call itself.
    fn persist_local(&self) {
        self.store.set(keys::CART, &self.items);
    }

    /// Add `quantity` of a product to the cart.
    ///
    /// Server path first; on failure the add falls back to a local
    /// mutation for this call only. The local add snapshots display fields
    /// from the product detail endpoint, or synthesizes a zero-price
    /// placeholder when even that fails - the add itself never fails.
    pub async fn add(&mut self, session: &Session, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }

        if self.server_path(session) {
            match self.gateway.add_to_cart(product_id, quantity).await {
                Ok(()) => {
                    self.load(session).await;
                    return;
                }
                Err(error) => {
                    warn!(%product_id, %error, "server cart add failed, falling back to local add");
                }
            }
        }

        self.add_local(product_id, quantity).await;
    }

    async fn add_local(&mut self, product_id: &ProductId, quantity: u32) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            let item = match self.gateway.get_product(product_id).await {
                Ok(product) => CartItem::from_product(&product, quantity),
                Err(error) => {
                    warn!(%product_id, %error, "product detail fetch failed, adding placeholder cart line");
                    CartItem::placeholder(product_id.clone(), quantity)
                }
            };
            self.items.push(item);
        }
        self.persist_local();
    }

    /// Change a line's quantity by `delta` (positive or negative).
    ///
    /// A resulting quantity of zero or less removes the line; a line is
    /// never kept at a non-positive quantity. Unknown product ids are
    /// ignored.
    pub async fn update_quantity(&mut self, session: &Session, product_id: &ProductId, delta: i64) {
        let Some(position) = self
            .items
            .iter()
            .position(|item| &item.product_id == product_id)
        else {
            debug!(%product_id, "quantity update for a product not in the cart");
            return;
        };

        let old_quantity = self.items.get(position).map_or(1, |item| item.quantity);
        let new_quantity = i64::from(old_quantity) + delta;
        if new_quantity <= 0 {
            self.remove(session, product_id).await;
            return;
        }
        let new_quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);

        if self.server_path(session) {
            match self
                .gateway
                .update_cart_item(product_id, new_quantity)
                .await
            {
                Ok(()) => {
                    self.load(session).await;
                    return;
                }
                Err(error) => {
                    warn!(%product_id, %error, "server cart update failed, falling back to local update");
                }
            }
        }

        if let Some(item) = self.items.get_mut(position) {
            item.quantity = new_quantity;
        }
        self.persist_local();
    }

    /// Remove a line from the cart. Unknown product ids are ignored.
    pub async fn remove(&mut self, session: &Session, product_id: &ProductId) {
        if !self
            .items
            .iter()
            .any(|item| &item.product_id == product_id)
        {
            debug!(%product_id, "remove for a product not in the cart");
            return;
        }

        if self.server_path(session) {
            match self.gateway.remove_from_cart(product_id).await {
                Ok(()) => {
                    self.load(session).await;
                    return;
                }
                Err(error) => {
                    warn!(%product_id, %error, "server cart removal failed, falling back to local removal");
                }
            }
        }

        self.items.retain(|item| &item.product_id != product_id);
        self.persist_local();
    }

    /// Empty the cart in whichever mode is active.
    ///
    /// The local file is cleared even in server mode so stale local data
    /// cannot resurface in a later session.
    pub async fn clear(&mut self, session: &Session) {
        if self.server_path(session)
            && let Err(error) = self.gateway.clear_cart().await
        {
            warn!(%error, "server cart clear failed, clearing locally");
        }
        self.items.clear();
        self.store.remove(keys::CART);
    }

    /// Force guest mode and empty both the in-memory cart and the local
    /// file. After logout the guest view is always an empty cart, never
    /// the previous session's server cart.
    pub fn clear_on_logout(&mut self) {
        self.use_server = false;
        self.items.clear();
        self.store.remove(keys::CART);
    }

    // -- Totals -------------------------------------------------------------

    /// Sum of `price * quantity` over all lines.
    ///
    /// Prices are NaN-proofed at the wire boundary, so a malformed price
    /// contributes zero rather than poisoning the total.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Fixed-rate tax on a subtotal, rounded to cents.
    #[must_use]
    pub fn tax(&self, subtotal: Decimal) -> Decimal {
        round_cents(subtotal * tax_rate())
    }

    /// Flat shipping fee, waived entirely above the free-shipping
    /// threshold.
    #[must_use]
    pub fn shipping(&self, subtotal: Decimal) -> Decimal {
        if subtotal > free_shipping_threshold() {
            Decimal::ZERO
        } else {
            flat_shipping_fee()
        }
    }

    /// Subtotal + tax + shipping.
    #[must_use]
    pub fn total(&self) -> Decimal {
        let subtotal = self.subtotal();
        subtotal + self.tax(subtotal) + self.shipping(subtotal)
    }

    // -- Accessors ----------------------------------------------------------

    /// The current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the engine is still on the server-backed store for this
    /// session (it may yet be guest-local if the session is anonymous).
    #[must_use]
    pub fn is_server_mode(&self) -> bool {
        self.use_server
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeGateway, authenticated_session, sample_product, temp_dir};

    fn guest_cart(gateway: Arc<FakeGateway>) -> CartService<FakeGateway> {
        let store = LocalStore::open(temp_dir()).unwrap();
        CartService::new(gateway, store, true)
    }

    #[tokio::test]
    async fn test_add_merges_duplicate_products() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.seed_product(sample_product("p1", "Mug", "10"));
        let mut cart = guest_cart(Arc::clone(&gateway));
        let session = Session::anonymous();

        cart.add(&session, &"p1".into(), 2).await;
        cart.add(&session, &"p1".into(), 3).await;

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_quantity_never_non_positive() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.seed_product(sample_product("p1", "Mug", "10"));
        let mut cart = guest_cart(Arc::clone(&gateway));
        let session = Session::anonymous();

        cart.add(&session, &"p1".into(), 1).await;
        cart.update_quantity(&session, &"p1".into(), -1).await;
        assert!(cart.is_empty());

        cart.add(&session, &"p1".into(), 2).await;
        cart.update_quantity(&session, &"p1".into(), -5).await;
        assert!(cart.is_empty());
        assert!(cart.items().iter().all(|item| item.quantity >= 1));
    }

    #[tokio::test]
    async fn test_placeholder_on_product_fetch_failure() {
        let gateway = Arc::new(FakeGateway::new());
        // No products seeded: the detail fetch 404s.
        let mut cart = guest_cart(Arc::clone(&gateway));
        let session = Session::anonymous();

        cart.add(&session, &"ghost".into(), 1).await;

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].price, Decimal::ZERO);
        assert_eq!(cart.items()[0].title, "Product ghost");
    }

    #[tokio::test]
    async fn test_totals() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.seed_product(sample_product("p1", "Mug", "10"));
        gateway.seed_product(sample_product("p2", "Hat", "5"));
        let mut cart = guest_cart(Arc::clone(&gateway));
        let session = Session::anonymous();

        cart.add(&session, &"p1".into(), 2).await;
        cart.add(&session, &"p2".into(), 1).await;

        let subtotal = cart.subtotal();
        assert_eq!(subtotal, Decimal::from(25));
        assert_eq!(cart.tax(subtotal), Decimal::new(200, 2));
        assert_eq!(cart.shipping(subtotal), Decimal::new(999, 2));
        assert_eq!(cart.shipping(Decimal::from(60)), Decimal::ZERO);
        // The boundary still pays the flat fee.
        assert_eq!(cart.shipping(Decimal::from(50)), Decimal::new(999, 2));
    }

    #[tokio::test]
    async fn test_local_round_trip_across_reload() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.seed_product(sample_product("p1", "Mug", "10"));
        let dir = temp_dir();
        let session = Session::anonymous();

        {
            let store = LocalStore::open(&dir).unwrap();
            let mut cart = CartService::new(Arc::clone(&gateway), store, true);
            cart.initialize(&session).await;
            cart.add(&session, &"p1".into(), 2).await;
        }

        let store = LocalStore::open(&dir).unwrap();
        let mut cart = CartService::new(gateway, store, true);
        cart.initialize(&session).await;

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].product_id.as_str(), "p1");
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[0].price, Decimal::from(10));
    }

    #[tokio::test]
    async fn test_server_mode_round_trip() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.seed_product(sample_product("p1", "Mug", "10"));
        let mut cart = guest_cart(Arc::clone(&gateway));
        let session = authenticated_session();

        cart.initialize(&session).await;
        cart.add(&session, &"p1".into(), 2).await;
        assert_eq!(gateway.server_cart_len(), 1);
        assert_eq!(cart.items().len(), 1);

        cart.update_quantity(&session, &"p1".into(), 1).await;
        assert_eq!(cart.items()[0].quantity, 3);

        cart.remove(&session, &"p1".into()).await;
        assert!(cart.is_empty());
        assert_eq!(gateway.server_cart_len(), 0);
    }

    #[tokio::test]
    async fn test_load_failure_flips_mode_for_session() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.fail_cart(true);
        let mut cart = guest_cart(Arc::clone(&gateway));
        let session = authenticated_session();

        cart.initialize(&session).await;
        assert!(!cart.is_server_mode());

        // Even after the server recovers, this session stays local.
        gateway.fail_cart(false);
        gateway.seed_product(sample_product("p1", "Mug", "10"));
        cart.add(&session, &"p1".into(), 1).await;
        assert_eq!(gateway.server_cart_len(), 0);
        assert_eq!(cart.items().len(), 1);

        // Re-initializing restores the configured preference.
        cart.initialize(&session).await;
        assert!(cart.is_server_mode());
    }

    #[tokio::test]
    async fn test_mutation_failure_is_call_scoped() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.seed_product(sample_product("p1", "Mug", "10"));
        gateway.seed_product(sample_product("p2", "Hat", "5"));
        let mut cart = guest_cart(Arc::clone(&gateway));
        let session = authenticated_session();

        cart.initialize(&session).await;
        assert!(cart.is_server_mode());

        // One failing mutation falls back locally without flipping the mode.
        gateway.fail_cart_mutations(true);
        cart.add(&session, &"p1".into(), 1).await;
        assert!(cart.is_server_mode());
        assert_eq!(cart.items().len(), 1);
        assert_eq!(gateway.server_cart_len(), 0);

        // The next mutation goes back to the server.
        gateway.fail_cart_mutations(false);
        cart.add(&session, &"p2".into(), 1).await;
        assert_eq!(gateway.server_cart_len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_cart_recoverable_after_reload() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.fail_cart(true);
        gateway.seed_product(sample_product("p1", "Mug", "10"));
        let dir = temp_dir();
        let session = authenticated_session();

        {
            let store = LocalStore::open(&dir).unwrap();
            let mut cart = CartService::new(Arc::clone(&gateway), store, true);
            cart.initialize(&session).await;
            cart.add(&session, &"p1".into(), 1).await;
        }

        // A fresh guest engine sees the locally persisted fallback cart.
        let store = LocalStore::open(&dir).unwrap();
        let mut cart = CartService::new(gateway, store, true);
        cart.load(&Session::anonymous()).await;
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_wipes_local_even_in_server_mode() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.seed_product(sample_product("p1", "Mug", "10"));
        let dir = temp_dir();
        let store = LocalStore::open(&dir).unwrap();
        let mut cart = CartService::new(Arc::clone(&gateway), store, true);
        let session = authenticated_session();

        cart.initialize(&session).await;
        cart.add(&session, &"p1".into(), 1).await;
        cart.clear(&session).await;

        assert!(cart.is_empty());
        assert_eq!(gateway.server_cart_len(), 0);
        assert!(!LocalStore::open(&dir).unwrap().contains(keys::CART));
    }

    #[tokio::test]
    async fn test_clear_on_logout_always_yields_empty_guest_cart() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.seed_product(sample_product("p1", "Mug", "10"));
        let dir = temp_dir();
        let store = LocalStore::open(&dir).unwrap();
        let mut cart = CartService::new(gateway, store, true);
        let session = authenticated_session();

        cart.initialize(&session).await;
        cart.add(&session, &"p1".into(), 1).await;
        cart.clear_on_logout();

        assert!(cart.is_empty());
        assert!(!cart.is_server_mode());
        assert!(!LocalStore::open(&dir).unwrap().contains(keys::CART));
    }

    #[tokio::test]
    async fn test_corrupt_local_cart_loads_empty() {
        let gateway = Arc::new(FakeGateway::new());
        let dir = temp_dir();
        std::fs::write(dir.join("cart.json"), "[{]").unwrap();
        let store = LocalStore::open(&dir).unwrap();
        let mut cart = CartService::new(gateway, store, false);

        cart.initialize(&Session::anonymous()).await;
        assert!(cart.is_empty());
    }
}

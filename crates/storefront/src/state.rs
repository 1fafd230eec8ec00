//! The `Storefront` facade: the dependency-injection root.
//!
//! One gateway and one service instance each, constructed together at
//! application start and passed around by reference - nothing here is
//! reachable as a global.

use std::sync::Arc;

use crate::auth::AuthService;
use crate::cart::CartService;
use crate::catalog::CatalogService;
use crate::checkout::CheckoutService;
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::gateway::{Gateway, HttpGateway};
use crate::payment::PaymentService;
use crate::shipping::ShippingService;
use crate::storage::LocalStore;

/// All storefront services over one shared gateway.
///
/// Fields are public: each service carries its own invariants, and flows
/// that span services (checkout needs the cart, the session and the
/// shipping selection at once) borrow the fields they need directly.
pub struct Storefront<G = HttpGateway> {
    gateway: Arc<G>,
    pub auth: AuthService<G>,
    pub cart: CartService<G>,
    pub catalog: CatalogService<G>,
    pub shipping: ShippingService<G>,
    pub payments: PaymentService<G>,
    pub checkout: CheckoutService<G>,
}

impl Storefront<HttpGateway> {
    /// Build the full service graph over an HTTP gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the local data directory cannot be created.
    pub fn new(config: &StorefrontConfig) -> Result<Self, StorefrontError> {
        let gateway = Arc::new(HttpGateway::new(config));
        Self::with_gateway(gateway, config)
    }
}

impl<G: Gateway> Storefront<G> {
    /// Build the service graph over any gateway implementation.
    ///
    /// # Errors
    ///
    /// Returns an error if the local data directory cannot be created.
    pub fn with_gateway(gateway: Arc<G>, config: &StorefrontConfig) -> Result<Self, StorefrontError> {
        let store = LocalStore::open(&config.data_dir)?;

        Ok(Self {
            auth: AuthService::new(Arc::clone(&gateway), store.clone()),
            cart: CartService::new(
                Arc::clone(&gateway),
                store.clone(),
                config.prefer_server_cart,
            ),
            catalog: CatalogService::new(Arc::clone(&gateway)),
            shipping: ShippingService::new(Arc::clone(&gateway)),
            payments: PaymentService::new(Arc::clone(&gateway)),
            checkout: CheckoutService::new(Arc::clone(&gateway), store),
            gateway,
        })
    }

    /// The shared gateway, for components wired outside the facade (the
    /// admin console).
    #[must_use]
    pub fn gateway(&self) -> Arc<G> {
        Arc::clone(&self.gateway)
    }

    /// Start-of-page initialization, in dependency order: the session is
    /// restored first, then the cart decides its storage mode from it.
    pub async fn start(&mut self) {
        self.auth.restore();
        self.cart.initialize(self.auth.session()).await;
    }

    /// Log out and force the guest cart view: the session is cleared and
    /// the cart engine drops to an empty local cart.
    pub fn logout(&mut self) {
        self.auth.logout();
        self.cart.clear_on_logout();
    }
}

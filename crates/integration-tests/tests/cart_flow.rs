//! Cart flows over real HTTP: server round trips, payload-shape
//! normalization, and the fallback-to-local behavior.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use coralcart_integration_tests::{CartRow, CartShape, StubState, spawn};
use coralcart_storefront::Storefront;

async fn logged_in_shop(
    server: &coralcart_integration_tests::StubServer,
) -> Storefront {
    let mut shop = Storefront::new(&server.config()).unwrap();
    shop.start().await;
    shop.auth.login("sam@example.com", "hunter22").await.unwrap();
    let session = shop.auth.session().clone();
    shop.cart.initialize(&session).await;
    shop
}

fn seeded_state() -> StubState {
    let mut state = StubState::default();
    state
        .products
        .push(StubState::product("p1", "Mug", 10.0, "kitchen"));
    state
        .products
        .push(StubState::product("p2", "Hat", 5.0, "apparel"));
    state
}

#[tokio::test]
async fn test_server_cart_round_trip() {
    let server = spawn(seeded_state()).await;
    let mut shop = logged_in_shop(&server).await;
    let session = shop.auth.session().clone();

    shop.cart.add(&session, &"p1".into(), 2).await;
    shop.cart.add(&session, &"p1".into(), 1).await;
    shop.cart.add(&session, &"p2".into(), 1).await;

    // Adds merged server-side; the engine shows the server's view.
    assert_eq!(shop.cart.items().len(), 2);
    assert_eq!(shop.cart.items()[0].quantity, 3);
    assert_eq!(shop.cart.subtotal(), Decimal::from(35));
    assert_eq!(server.state().cart.len(), 2);

    shop.cart.update_quantity(&session, &"p1".into(), -2).await;
    assert_eq!(shop.cart.items()[0].quantity, 1);

    shop.cart.remove(&session, &"p2".into()).await;
    assert_eq!(shop.cart.items().len(), 1);

    shop.cart.clear(&session).await;
    assert!(shop.cart.is_empty());
    assert!(server.state().cart.is_empty());
}

#[tokio::test]
async fn test_every_cart_payload_shape_normalizes() {
    for shape in [
        CartShape::Items,
        CartShape::NestedCart,
        CartShape::Bare,
        CartShape::Data,
    ] {
        let mut state = seeded_state();
        state.cart_shape = shape;
        state.cart.push(CartRow {
            product_id: "p1".to_string(),
            quantity: 2,
        });
        let server = spawn(state).await;
        let shop = logged_in_shop(&server).await;

        assert_eq!(shop.cart.items().len(), 1, "shape {shape:?}");
        let item = &shop.cart.items()[0];
        assert_eq!(item.product_id.as_str(), "p1", "shape {shape:?}");
        assert_eq!(item.title, "Mug", "shape {shape:?}");
        assert_eq!(item.quantity, 2, "shape {shape:?}");
        assert_eq!(item.price, Decimal::from(10), "shape {shape:?}");
    }
}

#[tokio::test]
async fn test_cart_load_failure_falls_back_to_local() {
    let mut state = seeded_state();
    state.fail_cart = true;
    let server = spawn(state).await;
    let config = server.config();

    let mut shop = Storefront::new(&config).unwrap();
    shop.start().await;
    shop.auth.login("sam@example.com", "hunter22").await.unwrap();
    let session = shop.auth.session().clone();
    shop.cart.initialize(&session).await;

    // The failed load flipped the engine to local mode for the session.
    assert!(!shop.cart.is_server_mode());

    // Adds persist locally (the product detail endpoint still works).
    shop.cart.add(&session, &"p1".into(), 2).await;
    assert_eq!(shop.cart.items().len(), 1);
    assert!(server.state().cart.is_empty());

    // The local cart is recoverable after a reload of the same profile.
    let mut reloaded = Storefront::new(&config).unwrap();
    reloaded.start().await;
    // The gateway still fails, so the reload lands on the same local cart.
    assert_eq!(reloaded.cart.items().len(), 1);
    assert_eq!(reloaded.cart.items()[0].product_id.as_str(), "p1");
    assert_eq!(reloaded.cart.items()[0].quantity, 2);
}

#[tokio::test]
async fn test_guest_cart_is_local_and_persistent() {
    let server = spawn(seeded_state()).await;
    let config = server.config();

    let mut shop = Storefront::new(&config).unwrap();
    shop.start().await;
    let session = shop.auth.session().clone();
    assert!(!session.is_authenticated());

    shop.cart.add(&session, &"p2".into(), 3).await;
    assert_eq!(shop.cart.items().len(), 1);
    // Nothing reached the server cart.
    assert!(server.state().cart.is_empty());

    let mut reloaded = Storefront::new(&config).unwrap();
    reloaded.start().await;
    assert_eq!(reloaded.cart.items().len(), 1);
    assert_eq!(reloaded.cart.total_quantity(), 3);
}

#[tokio::test]
async fn test_logout_leaves_empty_guest_cart() {
    let server = spawn(seeded_state()).await;
    let mut shop = logged_in_shop(&server).await;
    let session = shop.auth.session().clone();

    shop.cart.add(&session, &"p1".into(), 1).await;
    assert!(!shop.cart.is_empty());

    shop.logout();
    assert!(shop.cart.is_empty());
    assert!(!shop.auth.is_authenticated());

    // A fresh start as a guest still shows nothing.
    let mut reloaded = Storefront::new(&server.config()).unwrap();
    reloaded.start().await;
    assert!(reloaded.cart.is_empty());
}

#[tokio::test]
async fn test_catalog_filters_and_categories() {
    let server = spawn(seeded_state()).await;
    let mut shop = Storefront::new(&server.config()).unwrap();
    shop.start().await;

    shop.catalog.refresh().await.unwrap();
    assert_eq!(shop.catalog.products().len(), 2);

    shop.catalog.filter_by_category(Some("kitchen")).await.unwrap();
    assert_eq!(shop.catalog.products().len(), 1);
    assert_eq!(shop.catalog.products()[0].title, "Mug");

    shop.catalog.filter_by_category(Some("all")).await.unwrap();
    shop.catalog.search(Some("hat")).await.unwrap();
    assert_eq!(shop.catalog.products().len(), 1);
    assert_eq!(shop.catalog.products()[0].title, "Hat");

    let categories = shop.catalog.categories().await;
    assert_eq!(categories, vec!["all", "kitchen", "apparel"]);
}

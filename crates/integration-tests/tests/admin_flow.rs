//! Admin console flows: role gating and CRUD with reload-after-mutation.

#![allow(clippy::unwrap_used)]

use coralcart_admin::{AdminConsole, AdminError};
use coralcart_core::OrderStatus;
use coralcart_integration_tests::{StubState, spawn};
use coralcart_storefront::Storefront;

fn seeded_state() -> StubState {
    let mut state = StubState::default();
    state
        .products
        .push(StubState::product("p1", "Mug", 10.0, "kitchen"));
    state
        .users
        .push(StubState::user("u-admin", "Ada Admin", "ada@example.com", Some("admin")));
    state
        .users
        .push(StubState::user("u-cust", "Cal Customer", "cal@example.com", Some("customer")));
    state
        .users
        .push(StubState::user("u-old", "Old Account", "old@example.com", None));
    state
}

async fn signed_in(server: &coralcart_integration_tests::StubServer, email: &str) -> Storefront {
    let mut shop = Storefront::new(&server.config()).unwrap();
    shop.start().await;
    shop.auth.login(email, "hunter22").await.unwrap();
    shop
}

#[tokio::test]
async fn test_console_requires_admin_role() {
    let server = spawn(seeded_state()).await;

    let admin = signed_in(&server, "ada@example.com").await;
    assert!(AdminConsole::open(admin.gateway(), admin.auth.session()).is_ok());

    let customer = signed_in(&server, "cal@example.com").await;
    assert!(matches!(
        AdminConsole::open(customer.gateway(), customer.auth.session()),
        Err(AdminError::NotAuthorized)
    ));

    // A user with no role field at all is NOT an admin.
    let roleless = signed_in(&server, "old@example.com").await;
    assert!(matches!(
        AdminConsole::open(roleless.gateway(), roleless.auth.session()),
        Err(AdminError::NotAuthorized)
    ));
}

#[tokio::test]
async fn test_user_management_reloads_after_mutation() {
    let server = spawn(seeded_state()).await;
    let admin = signed_in(&server, "ada@example.com").await;
    let mut console = AdminConsole::open(admin.gateway(), admin.auth.session()).unwrap();

    let users = console.load_users().await.unwrap();
    assert_eq!(users.len(), 3);

    console.delete_user(&"u-old".into()).await.unwrap();
    // The list was reloaded from the gateway after the delete.
    assert_eq!(console.users().len(), 2);

    console
        .update_user(&"u-cust".into(), "Cal Updated", Some("admin"))
        .await
        .unwrap();
    let updated = console
        .users()
        .iter()
        .find(|u| u.id.as_str() == "u-cust")
        .unwrap();
    assert_eq!(updated.name, "Cal Updated");
    assert!(updated.is_admin());
}

#[tokio::test]
async fn test_order_status_update() {
    let server = spawn(seeded_state()).await;

    // Create an order through a normal checkout first.
    let mut shopper = signed_in(&server, "cal@example.com").await;
    let session = shopper.auth.session().clone();
    shopper.cart.initialize(&session).await;
    shopper.cart.add(&session, &"p1".into(), 1).await;
    let form = coralcart_storefront::checkout::CheckoutForm {
        customer: coralcart_storefront::gateway::CustomerInfo {
            first_name: "Cal".to_string(),
            last_name: "Customer".to_string(),
            email: "cal@example.com".to_string(),
            phone: None,
            address: coralcart_storefront::gateway::Address {
                line1: "2 Dock St".to_string(),
                line2: None,
                city: "Portland".to_string(),
                state: "OR".to_string(),
                postal_code: "97201".to_string(),
                country: "US".to_string(),
            },
            billing_address: None,
        },
        payment_method: coralcart_core::PaymentMethod::Paypal,
        card: None,
        shipping_method: coralcart_core::ShippingMethod::Standard,
    };
    shopper
        .checkout
        .place_order(&mut shopper.cart, &session, &shopper.shipping, &form)
        .await
        .unwrap();

    let admin = signed_in(&server, "ada@example.com").await;
    let mut console = AdminConsole::open(admin.gateway(), admin.auth.session()).unwrap();

    let orders = console.load_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Pending);
    let order_id = orders[0].id.clone();

    console
        .update_order_status(&order_id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(console.orders()[0].status, OrderStatus::Shipped);
}

#[tokio::test]
async fn test_product_crud() {
    let server = spawn(seeded_state()).await;
    let admin = signed_in(&server, "ada@example.com").await;
    let mut console = AdminConsole::open(admin.gateway(), admin.auth.session()).unwrap();

    console.load_products().await.unwrap();
    assert_eq!(console.products().len(), 1);

    let draft = coralcart_admin::console::product_draft(
        "Lantern",
        Some("Storm lantern"),
        "24.50".parse().unwrap(),
        "marine, outdoors",
        "lantern.jpg",
        5,
        true,
    );
    let created = console.create_product(&draft).await.unwrap();
    assert_eq!(console.products().len(), 2);

    console.delete_product(&created.id).await.unwrap();
    assert_eq!(console.products().len(), 1);
}

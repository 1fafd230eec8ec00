//! CLI command implementations, one module per storefront page.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod shipping;

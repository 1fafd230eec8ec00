//! CoralCart Storefront SDK.
//!
//! A client-side storefront engine over a remote REST commerce gateway:
//! product browsing and filtering, a shopping cart (server-backed with a
//! local fallback), checkout orchestration, payment-form collection,
//! shipping-rate selection, and an authenticated session holder.
//!
//! # Architecture
//!
//! - [`gateway`] - the REST contract behind the [`gateway::Gateway`] trait,
//!   implemented over HTTP by [`gateway::HttpGateway`]. Heterogeneous wire
//!   shapes are normalized into canonical types at this boundary; nothing
//!   above it sniffs payload shapes.
//! - [`cart`] - the cart state engine. Decides between the server-backed
//!   and local backing store and degrades gracefully: a failed gateway call
//!   falls back to local behavior instead of surfacing an error.
//! - [`checkout`] - the order orchestrator state machine, including the
//!   partial-failure policy for orders whose payment step fails.
//! - [`catalog`], [`shipping`], [`payment`] - product filtering, carrier
//!   rate selection, and payment collection.
//! - [`auth`] - token/session persistence and the login/register flow.
//! - [`state`] - the [`Storefront`] facade wiring the services together;
//!   services are constructed once and passed by reference, never reached
//!   through globals.
//!
//! # Example
//!
//! ```rust,ignore
//! use coralcart_storefront::{Storefront, config::StorefrontConfig};
//!
//! let config = StorefrontConfig::from_env()?;
//! let mut shop = Storefront::new(&config)?;
//! shop.start().await;
//!
//! let session = shop.auth.session().clone();
//! shop.cart.add(&session, &"p-100".into(), 1).await;
//! println!("subtotal: {}", shop.cart.subtotal());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod payment;
pub mod shipping;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, StorefrontError};
pub use state::Storefront;

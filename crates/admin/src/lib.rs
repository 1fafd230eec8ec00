//! CoralCart Admin - role-gated administration console.
//!
//! Thin list/edit/delete views over users, orders and products through the
//! same gateway the storefront uses. Opening the console requires an
//! explicit `admin` role on the signed-in user; a user with no role at all
//! is a plain customer and is denied.
//!
//! After any mutation the affected list is reloaded from the gateway, so
//! the console never shows locally-patched state.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod console;
pub mod error;
pub mod table;

pub use console::AdminConsole;
pub use error::AdminError;

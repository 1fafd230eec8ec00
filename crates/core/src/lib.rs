//! CoralCart Core - Shared types library.
//!
//! This crate provides common types used across all CoralCart components:
//! - `storefront` - Client SDK for the remote commerce gateway
//! - `admin` - Administration console over the same gateway
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, money helpers,
//!   and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

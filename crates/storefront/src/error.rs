//! Unified error handling.
//!
//! Each module defines its own error enum; `StorefrontError` unifies them
//! for callers (the CLI, the admin console) that drive whole flows. Cart
//! operations are deliberately absent: the cart engine's degradation
//! contract means it logs and falls back instead of erroring.

use thiserror::Error;

use crate::auth::AuthError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::gateway::ApiError;
use crate::shipping::ShippingError;
use crate::storage::StorageError;

/// Top-level error type for storefront flows.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The local data directory is unusable.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A gateway call failed.
    #[error("Gateway error: {0}")]
    Api(#[from] ApiError),

    /// An authentication flow failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// A checkout attempt failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// A shipping operation failed.
    #[error("Shipping error: {0}")]
    Shipping(#[from] ShippingError),
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

//! Admin console error types.

use thiserror::Error;

use coralcart_storefront::gateway::ApiError;

/// Errors from admin console operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The signed-in user does not carry the `admin` role. Users without
    /// any role are denied, not waved through.
    #[error("admin access requires an admin role")]
    NotAuthorized,

    /// A gateway call failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] ApiError),
}

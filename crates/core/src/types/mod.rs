//! Shared type definitions.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{from_cents, lenient_decimal, lenient_quantity, round_cents, to_cents};
pub use status::{
    OrderStatus, PaymentMethod, PaymentProcessor, ShippingMethod, SortKey, SortKeyError, UserRole,
};

//! Money helpers over [`rust_decimal::Decimal`].
//!
//! Amounts are currency-agnostic decimals in the currency's standard unit
//! (e.g. dollars). The gateway's payment endpoints and price filters speak
//! integer cents; conversion happens at the wire boundary with the helpers
//! here.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

/// Round an amount to two decimal places (cents).
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Convert an amount in currency units to integer cents.
///
/// Amounts that overflow `i64` cents are clamped to zero; the storefront
/// never handles amounts anywhere near that range.
#[must_use]
pub fn to_cents(amount: Decimal) -> i64 {
    (amount * Decimal::from(100)).round().to_i64().unwrap_or(0)
}

/// Convert integer cents to an amount in currency units.
#[must_use]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Coerce a loosely-typed wire value into a decimal amount.
///
/// The gateway is not consistent about number encoding: prices arrive as
/// JSON numbers, numeric strings, or are missing entirely. Anything that
/// does not parse cleanly becomes zero, so a malformed price can never
/// poison a computed total.
#[must_use]
pub fn lenient_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64_retain))
            .map_or(Decimal::ZERO, round_dp_if_fractional),
        Value::String(s) => s.trim().parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Coerce a loosely-typed wire value into an item quantity.
///
/// Missing or malformed quantities default to 1 (a cart row always stands
/// for at least one unit); negative values coerce to 0 so callers can drop
/// the row.
#[must_use]
pub fn lenient_quantity(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map_or(1, |q| u32::try_from(q).unwrap_or(0)),
        Value::String(s) => s.trim().parse().unwrap_or(1),
        Value::Null => 1,
        _ => 1,
    }
}

/// Binary floats like 9.99 carry noise digits once widened; trim them.
fn round_dp_if_fractional(amount: Decimal) -> Decimal {
    if amount.fract().is_zero() {
        amount
    } else {
        amount.round_dp(4)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cents_round_trip() {
        assert_eq!(to_cents(Decimal::new(1999, 2)), 1999);
        assert_eq!(from_cents(1999), Decimal::new(1999, 2));
        assert_eq!(to_cents(from_cents(999)), 999);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(Decimal::new(20005, 4)).to_string(), "2.00");
        assert_eq!(round_cents(Decimal::new(25, 1)).to_string(), "2.5");
    }

    #[test]
    fn test_lenient_decimal_shapes() {
        assert_eq!(lenient_decimal(&json!(10)), Decimal::from(10));
        assert_eq!(lenient_decimal(&json!(9.99)), Decimal::new(999, 2));
        assert_eq!(lenient_decimal(&json!("12.50")), Decimal::new(1250, 2));
        assert_eq!(lenient_decimal(&json!("not a price")), Decimal::ZERO);
        assert_eq!(lenient_decimal(&json!(null)), Decimal::ZERO);
        assert_eq!(lenient_decimal(&json!({"nested": true})), Decimal::ZERO);
    }

    #[test]
    fn test_lenient_quantity_shapes() {
        assert_eq!(lenient_quantity(&json!(3)), 3);
        assert_eq!(lenient_quantity(&json!("2")), 2);
        assert_eq!(lenient_quantity(&json!(null)), 1);
        assert_eq!(lenient_quantity(&json!(-4)), 0);
        assert_eq!(lenient_quantity(&json!("garbage")), 1);
    }
}

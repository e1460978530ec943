//! Fixed-point amounts.
//!
//! Every price and size in the book is a `u64` holding the decimal value
//! times 10^8. Matching only ever compares, adds and subtracts these raw
//! integers; decimal text appears at the edges (requests, logs, settlement)
//! and goes through `rust_decimal` here, never through `f64`.
//!
//! ```
//! use exchange_core::types::price::{from_fixed, to_fixed};
//!
//! let px = to_fixed("2001.5").unwrap();
//! assert_eq!(px, 200_150_000_000);
//! assert_eq!(from_fixed(px), "2001.50000000");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Raw units per whole unit (8 decimal places)
pub const SCALE: u64 = 100_000_000;

fn scale() -> Decimal {
    Decimal::from(SCALE)
}

/// Parse decimal text into raw units.
///
/// `None` for unparsable, negative or out-of-range input.
///
/// ```
/// use exchange_core::types::price::to_fixed;
///
/// assert_eq!(to_fixed("3"), Some(300_000_000));
/// assert_eq!(to_fixed("0.00000001"), Some(1));
/// assert_eq!(to_fixed("-0.5"), None);
/// ```
pub fn to_fixed(text: &str) -> Option<u64> {
    text.trim().parse::<Decimal>().ok().and_then(decimal_to_fixed)
}

/// Raw units for a `Decimal`, rounding past the 8th place.
pub fn decimal_to_fixed(value: Decimal) -> Option<u64> {
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    value.checked_mul(scale())?.round_dp(0).to_u64()
}

pub fn fixed_to_decimal(raw: u64) -> Decimal {
    Decimal::from(raw) / scale()
}

/// Render with all 8 decimal places.
pub fn from_fixed(raw: u64) -> String {
    format!("{:.8}", fixed_to_decimal(raw))
}

/// Render without trailing zeros, for logs.
///
/// ```
/// use exchange_core::types::price::from_fixed_trimmed;
///
/// assert_eq!(from_fixed_trimmed(250_000_000), "2.5");
/// ```
pub fn from_fixed_trimmed(raw: u64) -> String {
    fixed_to_decimal(raw).normalize().to_string()
}

/// Quote amount of a fill (`price * size`) in raw units; `None` on overflow.
///
/// ```
/// use exchange_core::types::price::{notional, to_fixed};
///
/// let price = to_fixed("2000").unwrap();
/// let size = to_fixed("0.25").unwrap();
/// assert_eq!(notional(price, size), to_fixed("500"));
/// ```
pub fn notional(price: u64, size: u64) -> Option<u64> {
    fixed_to_decimal(price)
        .checked_mul(fixed_to_decimal(size))
        .and_then(decimal_to_fixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_market_amounts() {
        assert_eq!(to_fixed("2002"), Some(200_200_000_000));
        assert_eq!(to_fixed("1998.25"), Some(199_825_000_000));
        assert_eq!(to_fixed(" 1.5 "), Some(150_000_000));
        assert_eq!(to_fixed("0"), Some(0));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(to_fixed("-3"), None);
        assert_eq!(to_fixed("1.2.3"), None);
        assert_eq!(to_fixed("ETH"), None);
        assert_eq!(to_fixed(""), None);
        // u64::MAX / 10^8 is about 1.8e11
        assert_eq!(to_fixed("1000000000000"), None);
    }

    #[test]
    fn test_sub_unit_digits_round() {
        assert_eq!(to_fixed("0.000000014"), Some(1));
        assert_eq!(to_fixed("0.000000016"), Some(2));
    }

    #[test]
    fn test_render() {
        assert_eq!(from_fixed(200_150_000_000), "2001.50000000");
        assert_eq!(from_fixed(7), "0.00000007");
        assert_eq!(from_fixed_trimmed(200_000_000_000), "2000");
        assert_eq!(from_fixed_trimmed(7), "0.00000007");
    }

    #[test]
    fn test_text_survives_parse_and_render() {
        for text in ["2001.50000000", "0.00000001", "98765.43210000"] {
            assert_eq!(from_fixed(to_fixed(text).unwrap()), text);
        }
    }

    #[test]
    fn test_notional() {
        assert_eq!(notional(to_fixed("2001.5").unwrap(), to_fixed("2").unwrap()), to_fixed("4003"));
        assert_eq!(notional(0, to_fixed("5").unwrap()), Some(0));
        assert_eq!(notional(u64::MAX, u64::MAX), None);
    }
}

//! Precision-safe decimal types for order-book arithmetic.
//!
//! Uses `rust_decimal` for exact decimal arithmetic. Order books are walked
//! level by level, so binary floating point would accumulate rounding error
//! across many small fills.

use crate::error::CoreError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest scale `Decimal` can represent.
const MAX_SCALE: u8 = 28;

/// Price of one order-book level, in the book's quoting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s)
            .map(Self)
            .map_err(|e| CoreError::InvalidPrice(format!("{s}: {e}")))
    }
}

/// Quantity of one order-book level, in base-token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s)
            .map(Self)
            .map_err(|e| CoreError::InvalidSize(format!("{s}: {e}")))
    }
}

/// Parse plain or scientific notation ("1e-7" shows up in maker books).
fn parse_decimal(s: &str) -> Result<Decimal, rust_decimal::Error> {
    let trimmed = s.trim();
    if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed)
    } else {
        Decimal::from_str(trimmed)
    }
}

/// Convert a smallest-unit integer amount into token units.
///
/// `1_500_000` with 6 decimals becomes `1.5`. Returns None when the amount
/// does not fit `Decimal`'s 96-bit mantissa or `decimals` exceeds its scale.
pub fn to_token_units(raw: u128, decimals: u8) -> Option<Decimal> {
    if decimals > MAX_SCALE {
        return None;
    }
    let value = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(value, u32::from(decimals))
        .ok()
        .map(|d| d.normalize())
}

/// Convert token units back into a smallest-unit integer, truncating.
///
/// The whole and fractional parts are scaled separately, so results beyond
/// `Decimal`'s mantissa still convert. Negative values and `u128` overflow
/// yield None.
pub fn from_token_units(value: Decimal, decimals: u8) -> Option<u128> {
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    if decimals > MAX_SCALE {
        return None;
    }
    let factor = 10i128.pow(u32::from(decimals));
    let whole = value.trunc().to_u128()?.checked_mul(factor.unsigned_abs())?;
    let fraction = value
        .fract()
        .checked_mul(Decimal::from_i128_with_scale(factor, 0))?
        .trunc()
        .to_u128()?;
    whole.checked_add(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_sign() {
        assert!(Price::new(dec!(0.5)).is_positive());
        assert!(!Price::new(Decimal::ZERO).is_positive());
        assert!(!Price::new(dec!(-1)).is_positive());
    }

    #[test]
    fn test_price_parse_scientific() {
        let price: Price = "1e-7".parse().unwrap();
        assert_eq!(price.inner(), dec!(0.0000001));

        let plain: Price = " 12.50 ".parse().unwrap();
        assert_eq!(plain.inner(), dec!(12.50));

        assert!(matches!("ten".parse::<Price>(), Err(CoreError::InvalidPrice(_))));
        assert!(matches!("".parse::<Size>(), Err(CoreError::InvalidSize(_))));
    }

    #[test]
    fn test_to_token_units() {
        assert_eq!(to_token_units(1_500_000, 6), Some(dec!(1.5)));
        assert_eq!(to_token_units(0, 18), Some(Decimal::ZERO));
        assert_eq!(
            to_token_units(7_000_000_000_000_000_000, 18),
            Some(dec!(7))
        );
        assert_eq!(to_token_units(1, 29), None);
        assert_eq!(to_token_units(u128::MAX, 0), None);
    }

    #[test]
    fn test_from_token_units_truncates() {
        assert_eq!(from_token_units(dec!(1.9999999), 6), Some(1_999_999));
        assert_eq!(from_token_units(dec!(72), 18), Some(72_000_000_000_000_000_000));
        assert_eq!(from_token_units(dec!(-1), 6), None);
    }

    #[test]
    fn test_from_token_units_beyond_mantissa() {
        // 1e11 tokens at 18 decimals is 1e29 units, past Decimal's 96 bits.
        assert_eq!(
            from_token_units(dec!(100000000000), 18),
            Some(100_000_000_000_000_000_000_000_000_000)
        );
        assert_eq!(
            from_token_units(dec!(123456789012.5), 18),
            Some(123_456_789_012_500_000_000_000_000_000)
        );
        assert_eq!(from_token_units(Decimal::MAX, 28), None);
    }
}

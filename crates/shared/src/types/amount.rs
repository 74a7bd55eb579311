//! Exact fixed-point money amount.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` and pins every value to two
//! fractional digits with round-half-up, so two amounts built from the same
//! input always compare equal.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when building or converting an [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The input could not be parsed as a decimal number.
    #[error("Invalid amount '{0}'")]
    Parse(String),

    /// The value does not fit the storage representation.
    #[error("Amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// A signed monetary amount in the tenant currency.
///
/// Always carries exactly [`Amount::SCALE`] fractional digits. Construction
/// from an arbitrary `Decimal` rounds half away from zero (`2.345 → 2.35`,
/// `-2.345 → -2.35`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Number of fractional digits kept for money.
    pub const SCALE: u32 = 2;

    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, Self::SCALE));

    /// Creates an amount, rounding half-up to two decimals.
    #[must_use]
    pub fn new(value: Decimal) -> Self {
        let mut rounded =
            value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(Self::SCALE);
        Self(rounded)
    }

    /// Creates an amount that is guaranteed to fit the storage range.
    ///
    /// Every amount entering from outside (parsing, deserialization) goes
    /// through here, so sums of a handful of them cannot overflow `Decimal`.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::OutOfRange` if the rounded value exceeds `i64` cents.
    pub fn try_new(value: Decimal) -> Result<Self, AmountError> {
        let amount = Self::new(value);
        amount.to_minor_units()?;
        Ok(amount)
    }

    /// Creates an amount from integer minor units (cents).
    #[must_use]
    pub fn from_minor_units(minor: i64) -> Self {
        Self(Decimal::new(minor, Self::SCALE))
    }

    /// Converts the amount to integer minor units (cents) for storage.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::OutOfRange` if the value exceeds `i64` cents.
    pub fn to_minor_units(self) -> Result<i64, AmountError> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.trunc().to_i64())
            .ok_or(AmountError::OutOfRange(self.0))
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is greater than zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is less than zero.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[must_use]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Checked addition, `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked subtraction, `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self::new(Decimal::from(value))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value =
            Decimal::from_str(trimmed).map_err(|_| AmountError::Parse(trimmed.to_string()))?;
        Self::try_new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, a| acc + *a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(2.345), dec!(2.35))]
    #[case(dec!(2.344), dec!(2.34))]
    #[case(dec!(-2.345), dec!(-2.35))]
    #[case(dec!(0.005), dec!(0.01))]
    #[case(dec!(10), dec!(10.00))]
    fn test_rounds_half_up(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(Amount::new(input).value(), expected);
    }

    #[test]
    fn test_display_always_two_decimals() {
        assert_eq!(Amount::new(dec!(1000)).to_string(), "1000.00");
        assert_eq!(Amount::new(dec!(-50.5)).to_string(), "-50.50");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
        assert_eq!(Amount::from_minor_units(0).to_string(), "0.00");
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(Amount::new(dec!(12.34)).to_minor_units(), Ok(1234));
        assert_eq!(Amount::new(dec!(-0.01)).to_minor_units(), Ok(-1));
        assert_eq!(Amount::from_minor_units(130_000), Amount::new(dec!(1300)));
    }

    #[test]
    fn test_minor_units_out_of_range() {
        let huge = Amount::new(Decimal::from(i64::MAX));
        assert!(matches!(huge.to_minor_units(), Err(AmountError::OutOfRange(_))));
    }

    #[test]
    fn test_parse() {
        assert_eq!("10.5".parse::<Amount>(), Ok(Amount::new(dec!(10.50))));
        assert_eq!(" 3 ".parse::<Amount>(), Ok(Amount::from(3)));
        assert!(matches!("abc".parse::<Amount>(), Err(AmountError::Parse(_))));
    }

    #[test]
    fn test_rejects_values_beyond_storage_range() {
        assert!(matches!(
            Amount::try_new(Decimal::MAX),
            Err(AmountError::OutOfRange(_))
        ));
        assert!(matches!(
            Decimal::MAX.to_string().parse::<Amount>(),
            Err(AmountError::OutOfRange(_))
        ));
        let json = format!("\"{}\"", Decimal::MAX);
        assert!(serde_json::from_str::<Amount>(&json).is_err());

        let largest = Amount::from_minor_units(i64::MAX);
        assert_eq!(Amount::try_new(largest.value()), Ok(largest));
    }

    #[test]
    fn test_sign_helpers() {
        assert!(Amount::ZERO.is_zero());
        assert!(Amount::from(5).is_positive());
        assert!(Amount::from(-5).is_negative());
        assert_eq!(Amount::from(-5).abs(), Amount::from(5));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Amount::new(dec!(1.5))).unwrap();
        assert_eq!(json, "\"1.50\"");
        let back: Amount = serde_json::from_str("\"2.005\"").unwrap();
        assert_eq!(back, Amount::new(dec!(2.01)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Storing as cents and reading back never changes the value.
        #[test]
        fn prop_minor_units_exact(cents in -1_000_000_000i64..1_000_000_000i64) {
            let amount = Amount::from_minor_units(cents);
            prop_assert_eq!(amount.to_minor_units(), Ok(cents));
        }

        /// Sum of amounts equals the amount of the summed cents.
        #[test]
        fn prop_sum_matches_cents(values in prop::collection::vec(-100_000i64..100_000i64, 0..20)) {
            let total: Amount = values.iter().map(|c| Amount::from_minor_units(*c)).sum();
            prop_assert_eq!(total, Amount::from_minor_units(values.iter().sum()));
        }
    }
}

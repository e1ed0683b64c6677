//! [`Amount`]-related definitions.

use std::{iter, ops, str::FromStr};

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{Decimal, RoundingStrategy};

/// Non-negative monetary amount with a two-decimal scale.
///
/// Construction normalizes the value to two decimal places, rounding
/// half-up, so two [`Amount`]s representing the same sum always compare
/// equal.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Amount(Decimal);

impl Amount {
    /// [`Amount`] of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Amount`] from the provided value, normalized to two
    /// decimal places (rounding half-up).
    ///
    /// [`None`] is returned if the value is negative.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        (value >= Decimal::ZERO).then(|| {
            Self(value.round_dp_with_strategy(
                2,
                RoundingStrategy::MidpointAwayFromZero,
            ))
        })
    }

    /// Indicates whether this [`Amount`] is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtracts the provided [`Amount`] from this one.
    ///
    /// [`None`] is returned if the result would be negative.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        (self.0 >= rhs.0).then(|| Self(self.0 - rhs.0))
    }

    /// Returns the weighted share of this [`Amount`], rounded to two
    /// decimal places (half-up).
    ///
    /// # Panics
    ///
    /// If `total_weight` is zero.
    #[must_use]
    pub fn share(self, weight: Decimal, total_weight: Decimal) -> Self {
        Self(
            (self.0 * weight / total_weight)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns the inner [`Decimal`] representation of this [`Amount`].
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

impl FromStr for Amount {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid amount")
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::Amount;

    impl serde::Serialize for Amount {
        fn serialize<S: Serializer>(
            &self,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for Amount {
        fn deserialize<D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Self, D::Error> {
            let raw = String::deserialize(deserializer)?;
            Self::from_str(&raw).map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Amount;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn normalizes_to_two_decimals() {
        assert_eq!(Amount::new(decimal("10.005")).unwrap(), amount("10.01"));
        assert_eq!(Amount::new(decimal("10.004")).unwrap(), amount("10.00"));
        assert_eq!(Amount::new(decimal("10")).unwrap(), amount("10.00"));
    }

    #[test]
    fn rejects_negative_values() {
        assert!(Amount::new(decimal("-0.01")).is_none());
        assert!(Amount::from_str("-1").is_err());
        assert!(Amount::from_str("abc").is_err());
    }

    #[test]
    fn checked_sub_underflows_to_none() {
        assert_eq!(
            amount("10.00").checked_sub(amount("3.50")),
            Some(amount("6.50")),
        );
        assert_eq!(
            amount("10.00").checked_sub(amount("10.00")),
            Some(Amount::ZERO),
        );
        assert!(amount("10.00").checked_sub(amount("10.01")).is_none());
    }

    #[test]
    fn share_rounds_half_up() {
        let pool = amount("100.00");
        assert_eq!(
            pool.share(decimal("33.33"), decimal("100")),
            amount("33.33"),
        );
        assert_eq!(pool.share(decimal("1"), decimal("3")), amount("33.33"));
        assert_eq!(pool.share(decimal("2"), decimal("3")), amount("66.67"));
    }

    #[test]
    fn sums_exactly() {
        let total: Amount =
            [amount("0.10"), amount("0.20"), amount("0.30")].into_iter().sum();
        assert_eq!(total, amount("0.60"));
    }
}

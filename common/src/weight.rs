//! [`Weight`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Aliquot percentage: a unit's fractional ownership share of a building,
/// used to prorate shared costs.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Weight(Decimal);

impl Weight {
    /// Creates a new [`Weight`] by checking the provided value is within
    /// the `0..=100` range.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (val >= Decimal::ZERO && val <= Decimal::ONE_HUNDRED).then_some(Self(val))
    }

    /// Indicates whether this [`Weight`] is greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns the inner [`Decimal`] representation of this [`Weight`].
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Weight {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid weight value")
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::Weight;

    #[test]
    fn bounds() {
        assert!(Weight::new(Decimal::ZERO).is_some());
        assert!(Weight::new(Decimal::ONE_HUNDRED).is_some());
        assert!(Weight::new("100.01".parse().unwrap()).is_none());
        assert!(Weight::new("-0.01".parse().unwrap()).is_none());
    }

    #[test]
    fn positivity() {
        assert!(!Weight::new(Decimal::ZERO).unwrap().is_positive());
        assert!(Weight::new("3.75".parse().unwrap()).unwrap().is_positive());
    }
}

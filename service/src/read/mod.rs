//! Read models of the [`Service`].
//!
//! [`Service`]: crate::Service

pub mod charge;
pub mod period;
pub mod unit;

use common::Amount;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Settlement state of an obligation, derived from its total and paid
/// amounts.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Settlement {
    /// Nothing has been paid yet.
    #[display("PENDING")]
    Pending,

    /// Some, but not all, of the total has been paid.
    #[display("PARTIAL")]
    Partial,

    /// The total is fully covered by payments.
    #[display("PAID")]
    Paid,
}

impl Settlement {
    /// Derives the [`Settlement`] state from the provided `total` and
    /// `paid` [`Amount`]s.
    #[must_use]
    pub fn of(total: Amount, paid: Amount) -> Self {
        if paid >= total {
            Self::Paid
        } else if paid.is_zero() {
            Self::Pending
        } else {
            Self::Partial
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Amount;

    use super::Settlement;

    #[test]
    fn derives_from_totals() {
        let amount = |s| Amount::from_str(s).unwrap();

        assert_eq!(
            Settlement::of(amount("100"), Amount::ZERO),
            Settlement::Pending,
        );
        assert_eq!(
            Settlement::of(amount("100"), amount("40")),
            Settlement::Partial,
        );
        assert_eq!(
            Settlement::of(amount("100"), amount("100")),
            Settlement::Paid,
        );
        assert_eq!(Settlement::of(Amount::ZERO, Amount::ZERO), Settlement::Paid);
    }
}

//! [`Period`] definitions.

use common::{define_kind, unit as marker, Amount, DateOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::building;

/// One common-expense billing cycle of a building: all the [`Charge`]s of
/// one month billed together.
///
/// At most one [`Period`] may exist per building and calendar month.
///
/// [`Charge`]: super::Charge
#[derive(Clone, Copy, Debug)]
pub struct Period {
    /// ID of this [`Period`].
    pub id: Id,

    /// ID of the building this [`Period`] belongs to.
    pub building_id: building::Id,

    /// Calendar [`Year`] of this [`Period`].
    pub year: Year,

    /// Calendar [`Month`] of this [`Period`].
    pub month: Month,

    /// [`Date`] when this [`Period`] was generated.
    ///
    /// [`Date`]: common::Date
    pub generated_at: GenerationDate,

    /// [`Date`] when the [`Charge`]s of this [`Period`] are due.
    ///
    /// [`Charge`]: super::Charge
    /// [`Date`]: common::Date
    pub due_date: DueDate,

    /// Reserve fund [`Amount`] prorated across the building's units when
    /// this [`Period`] was generated.
    pub reserve_amount: Amount,

    /// Total [`Amount`] of all [`Charge`]s of this [`Period`].
    ///
    /// Maintained incrementally on every charge insertion, never computed
    /// lazily.
    ///
    /// [`Charge`]: super::Charge
    pub total_amount: Amount,

    /// [`Status`] of this [`Period`].
    pub status: Status,
}

/// ID of a [`Period`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Calendar year of a [`Period`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Year(i16);

impl Year {
    /// Creates a new [`Year`] if the provided value is within the supported
    /// `2000..=2100` range.
    #[must_use]
    pub fn new(year: i16) -> Option<Self> {
        (2000..=2100).contains(&year).then_some(Self(year))
    }
}

impl FromStr for Year {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `Year`")
    }
}

/// Calendar month of a [`Period`] (1 through 12).
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Month(i16);

impl Month {
    /// Creates a new [`Month`] if the provided value is within the
    /// `1..=12` range.
    #[must_use]
    pub fn new(month: i16) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self(month))
    }
}

impl FromStr for Month {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `Month`")
    }
}

/// Sortable `year * 100 + month` index of a [`Period`], used for range
/// filtering of billing cycles.
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct CycleIndex(i32);

impl From<(Year, Month)> for CycleIndex {
    fn from((year, month): (Year, Month)) -> Self {
        Self(i32::from(year.0) * 100 + i32::from(month.0))
    }
}

define_kind! {
    #[doc = "Lifecycle status of a [`Period`]."]
    enum Status {
        #[doc = "The [`Period`] accepts new charges."]
        Open = 1,

        #[doc = "The [`Period`] is closed for modifications."]
        Closed = 2,
    }
}

/// Running totals of a [`Period`], persisted separately from the rest of
/// the row since they are only known after charge expansion.
#[derive(Clone, Copy, Debug)]
pub struct Totals {
    /// ID of the [`Period`] the totals belong to.
    pub id: Id,

    /// Total [`Amount`] of all the [`Period`]'s charges.
    pub total_amount: Amount,

    /// Reserve fund [`Amount`] of the [`Period`].
    pub reserve_amount: Amount,
}

/// [`Date`] when a [`Period`] was generated.
///
/// [`Date`]: common::Date
pub type GenerationDate = DateOf<(Period, marker::Generation)>;

/// [`Date`] when the charges of a [`Period`] are due.
///
/// [`Date`]: common::Date
pub type DueDate = DateOf<(Period, marker::Due)>;

#[cfg(test)]
mod spec {
    use super::{CycleIndex, Month, Year};

    #[test]
    fn year_range() {
        assert!(Year::new(2000).is_some());
        assert!(Year::new(2100).is_some());
        assert!(Year::new(1999).is_none());
        assert!(Year::new(2101).is_none());
    }

    #[test]
    fn month_range() {
        assert!(Month::new(1).is_some());
        assert!(Month::new(12).is_some());
        assert!(Month::new(0).is_none());
        assert!(Month::new(13).is_none());
    }

    #[test]
    fn cycle_index_sorts_chronologically() {
        let index = |y, m| {
            CycleIndex::from((Year::new(y).unwrap(), Month::new(m).unwrap()))
        };
        assert!(index(2026, 1) < index(2026, 2));
        assert!(index(2025, 12) < index(2026, 1));
        assert_eq!(i32::from(index(2026, 8)), 202_608);
    }
}

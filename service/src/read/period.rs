//! [`Period`] read model definitions.

use common::Amount;

use crate::domain::{building, period, revision, unit};
#[cfg(doc)]
use crate::domain::{Period, Revision};

use super::Settlement;

/// Administrator-facing summary of a [`Period`]: its attributes plus
/// charge and [`Revision`] counters.
#[derive(Clone, Copy, Debug)]
pub struct Summary {
    /// ID of the [`Period`].
    pub id: period::Id,

    /// Calendar year of the [`Period`].
    pub year: period::Year,

    /// Calendar month of the [`Period`].
    pub month: period::Month,

    /// Due date of the [`Period`].
    pub due_date: period::DueDate,

    /// Reserve fund amount of the [`Period`].
    pub reserve_amount: Amount,

    /// Total amount of all the [`Period`]'s charges.
    pub total_amount: Amount,

    /// Status of the [`Period`].
    pub status: period::Status,

    /// Number of charges belonging to the [`Period`].
    pub charges_count: i64,

    /// Number of [`Revision`]s recorded for the [`Period`].
    pub revisions_count: i64,

    /// [`DateTime`] of the latest [`Revision`], if any.
    ///
    /// [`DateTime`]: common::DateTime
    pub last_revision_at: Option<revision::CreationDateTime>,
}

/// Resident-facing summary of a [`Period`] narrowed down to one housing
/// unit: the unit's billed total, the paid part, and what remains.
#[derive(Clone, Copy, Debug)]
pub struct UnitSummary {
    /// ID of the [`Period`].
    pub id: period::Id,

    /// Calendar year of the [`Period`].
    pub year: period::Year,

    /// Calendar month of the [`Period`].
    pub month: period::Month,

    /// Due date of the [`Period`].
    pub due_date: period::DueDate,

    /// Status of the [`Period`].
    pub status: period::Status,

    /// Total amount billed to the unit within the [`Period`].
    pub total: Amount,

    /// Sum of confirmed payments made by the unit within the [`Period`].
    pub paid: Amount,
}

impl UnitSummary {
    /// Returns the outstanding [`Amount`] of the unit within the period.
    #[must_use]
    pub fn pending(&self) -> Amount {
        self.total.checked_sub(self.paid).unwrap_or(Amount::ZERO)
    }

    /// Returns the [`Settlement`] state of the unit within the period.
    #[must_use]
    pub fn settlement(&self) -> Settlement {
        Settlement::of(self.total, self.paid)
    }
}

/// Inclusive `year * 100 + month` range for filtering billing cycles.
#[derive(Clone, Copy, Debug, Default)]
pub struct CycleRange {
    /// Lower bound of the range, if any.
    pub from: Option<period::CycleIndex>,

    /// Upper bound of the range, if any.
    pub to: Option<period::CycleIndex>,
}

/// Selector of [`UnitSummary`]s: one housing unit within one building.
#[derive(Clone, Copy, Debug)]
pub struct UnitCycles {
    /// ID of the building whose [`Period`]s are listed.
    pub building_id: building::Id,

    /// ID of the housing unit the totals are narrowed down to.
    pub unit_id: unit::Id,

    /// Inclusive cycle range to filter by.
    pub range: CycleRange,
}

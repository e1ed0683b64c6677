//! [`Charge`] read model definitions.

use common::Amount;

use crate::domain::{period, Charge};

use super::Settlement;

/// [`Charge`] together with its billing-period context and the sum of
/// confirmed payments applied to it.
#[derive(Clone, Debug)]
pub struct Balance {
    /// The [`Charge`] itself.
    pub charge: Charge,

    /// Calendar year of the charge's period.
    pub year: period::Year,

    /// Calendar month of the charge's period.
    pub month: period::Month,

    /// Due date of the charge's period.
    pub due_date: period::DueDate,

    /// Status of the charge's period.
    pub period_status: period::Status,

    /// Sum of confirmed payments applied to the [`Charge`] (zero if none).
    pub paid: Amount,
}

impl Balance {
    /// Returns the outstanding [`Amount`] of the [`Charge`].
    #[must_use]
    pub fn pending(&self) -> Amount {
        self.charge
            .amount
            .checked_sub(self.paid)
            .unwrap_or(Amount::ZERO)
    }

    /// Returns the [`Settlement`] state of the [`Charge`].
    #[must_use]
    pub fn settlement(&self) -> Settlement {
        Settlement::of(self.charge.amount, self.paid)
    }
}

//! Housing unit read model definitions.

use common::Weight;
use rust_decimal::Decimal;

use crate::domain::unit;

/// Prorating share of a single housing unit: its aliquot [`Weight`] and
/// whether the unit currently has an active resident.
///
/// Never persisted on its own; used only as input of the
/// [`proration`] engine.
///
/// [`proration`]: crate::proration
#[derive(Clone, Copy, Debug)]
pub struct Share {
    /// ID of the housing unit.
    pub id: unit::Id,

    /// Aliquot [`Weight`] of the unit, if configured.
    pub weight: Option<Weight>,

    /// Indicates whether the unit currently has an active resident.
    pub has_active_resident: bool,
}

impl Share {
    /// Returns the effective prorating weight of this [`Share`].
    ///
    /// Units with no configured (or zero) aliquot are treated as one equal
    /// share, so they still receive a positive portion of a prorated
    /// amount.
    #[must_use]
    pub fn effective_weight(&self) -> Decimal {
        self.weight
            .filter(Weight::is_positive)
            .map_or(Decimal::ONE, |w| w.as_decimal())
    }
}

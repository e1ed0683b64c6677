//! Charge proration engine.
//!
//! Pure, I/O-free expansion of pool-level amounts into per-unit
//! [`Charge`]s, proportional to each unit's aliquot weight.
//!
//! Rounding each share independently can drift the total away from the
//! billed amount by a few cents, so the last unit (in the deterministic
//! unit order) absorbs whatever remains, keeping the sum of shares exactly
//! equal to the pool amount.

use common::Amount;
use derive_more::{Display, Error as StdError};
use rust_decimal::Decimal;

use crate::{
    domain::{
        charge::{self, PayerKind},
        period, unit, Charge,
    },
    read::unit::Share,
};

/// Request for a single charge to be billed within a [`Period`].
///
/// [`Period`]: crate::domain::Period
#[derive(Clone, Debug)]
pub struct Request {
    /// [`Description`] of the charge.
    ///
    /// [`Description`]: charge::Description
    pub description: charge::Description,

    /// [`Amount`] of the charge. For prorateable requests this is the pool
    /// amount to split across all units.
    pub amount: Amount,

    /// [`Category`] of the charge.
    ///
    /// [`Category`]: charge::Category
    pub category: charge::Category,

    /// Indicates whether the charge should be prorated across all the
    /// building's units. Non-prorateable requests bill a single unit.
    pub prorateable: bool,

    /// ID of the billed unit. Required (and only meaningful) for
    /// non-prorateable requests.
    pub unit_id: Option<unit::Id>,

    /// Free text to render on the payment receipt, if any.
    pub receipt_text: Option<charge::ReceiptText>,
}

/// Splits the provided pool `amount` across `units` proportionally to
/// their effective weights, producing one unpersisted [`Charge`] per unit.
///
/// The last unit in the provided order absorbs the rounding remainder, so
/// the produced shares always sum up to `amount` exactly.
///
/// # Errors
///
/// - [`Error::NoUsableWeights`] if `units` is empty (the only way the
///   total effective weight can be non-positive, since absent and zero
///   weights fall back to one equal share).
/// - [`Error::NegativeRemainder`] if accumulated rounding would push the
///   last unit's share below zero.
pub fn prorate(
    period_id: period::Id,
    description: &charge::Description,
    amount: Amount,
    category: &charge::Category,
    receipt_text: Option<&charge::ReceiptText>,
    units: &[Share],
) -> Result<Vec<Charge>, Error> {
    let total_weight: Decimal =
        units.iter().map(Share::effective_weight).sum();
    if total_weight <= Decimal::ZERO {
        return Err(Error::NoUsableWeights);
    }

    let mut remaining = amount;
    let mut charges = Vec::with_capacity(units.len());
    for (i, unit) in units.iter().enumerate() {
        let share = if i == units.len() - 1 {
            remaining
        } else {
            amount.share(unit.effective_weight(), total_weight)
        };
        remaining = remaining
            .checked_sub(share)
            .ok_or(Error::NegativeRemainder)?;

        charges.push(Charge {
            id: charge::Id::new(),
            period_id,
            unit_id: Some(unit.id),
            description: description.clone(),
            amount: share,
            category: category.clone(),
            prorated: true,
            payer_kind: PayerKind::from_occupancy(unit.has_active_resident),
            receipt_text: receipt_text.cloned(),
        });
    }
    Ok(charges)
}

/// Expands the reserve fund (if positive) and the provided charge
/// `requests` into concrete unpersisted [`Charge`]s of the given
/// [`Period`].
///
/// Prorateable requests are split across all `units` via [`prorate()`];
/// non-prorateable ones bill the single unit they name.
///
/// # Errors
///
/// - Any [`prorate()`] error.
/// - [`Error::InvalidAmount`] if a request's amount is zero.
/// - [`Error::MissingUnit`] if a non-prorateable request names no unit.
/// - [`Error::UnitNotInBuilding`] if a non-prorateable request names a
///   unit outside the period's building.
///
/// [`Period`]: crate::domain::Period
pub fn expand(
    period_id: period::Id,
    reserve: Amount,
    requests: &[Request],
    units: &[Share],
) -> Result<Vec<Charge>, Error> {
    let mut charges = Vec::new();
    if !reserve.is_zero() {
        charges.extend(prorate(
            period_id,
            &reserve_description(),
            reserve,
            &charge::Category::reserve(),
            None,
            units,
        )?);
    }
    for request in requests {
        if request.amount.is_zero() {
            return Err(Error::InvalidAmount);
        }
        if request.prorateable {
            charges.extend(prorate(
                period_id,
                &request.description,
                request.amount,
                &request.category,
                request.receipt_text.as_ref(),
                units,
            )?);
        } else {
            let unit_id = request.unit_id.ok_or(Error::MissingUnit)?;
            let unit = units
                .iter()
                .find(|u| u.id == unit_id)
                .ok_or(Error::UnitNotInBuilding(unit_id))?;

            charges.push(Charge {
                id: charge::Id::new(),
                period_id,
                unit_id: Some(unit_id),
                description: request.description.clone(),
                amount: request.amount,
                category: request.category.clone(),
                prorated: false,
                payer_kind: PayerKind::from_occupancy(
                    unit.has_active_resident,
                ),
                receipt_text: request.receipt_text.clone(),
            });
        }
    }
    Ok(charges)
}

/// [`Description`] of reserve fund charges.
///
/// [`Description`]: charge::Description
fn reserve_description() -> charge::Description {
    charge::Description::new("Reserve fund")
        .unwrap_or_else(|| unreachable!("non-blank literal"))
}

/// Error of expanding charge requests.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// A charge request has a zero amount.
    #[display("charge amount must be greater than zero")]
    InvalidAmount,

    /// A non-prorateable charge request names no unit.
    #[display("`unit_id` is required for a non-prorateable charge")]
    MissingUnit,

    /// Accumulated rounding left no remainder for the last unit.
    #[display("rounded shares exceed the prorated amount")]
    NegativeRemainder,

    /// There are no units to prorate across.
    #[display("no usable weights to prorate the amount across")]
    NoUsableWeights,

    /// A non-prorateable charge request names a unit outside the period's
    /// building.
    #[display("`Unit(id: {_0})` doesn't belong to the period's building")]
    UnitNotInBuilding(#[error(not(source))] unit::Id),
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Amount, Weight};

    use crate::{
        domain::{charge, period, unit},
        read::unit::Share,
    };

    use super::{expand, prorate, Error, Request};

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn share(weight: Option<&str>, occupied: bool) -> Share {
        Share {
            id: unit::Id::new(),
            weight: weight.map(|w| Weight::from_str(w).unwrap()),
            has_active_resident: occupied,
        }
    }

    fn description() -> charge::Description {
        charge::Description::new("Cleaning").unwrap()
    }

    fn category() -> charge::Category {
        charge::Category::new("MAINTENANCE").unwrap()
    }

    fn shares_of(charges: &[crate::domain::Charge]) -> Vec<Amount> {
        charges.iter().map(|c| c.amount).collect()
    }

    #[test]
    fn splits_proportionally_to_weights() {
        let units = [
            share(Some("50"), true),
            share(Some("30"), true),
            share(Some("20"), true),
        ];

        let charges = prorate(
            period::Id::new(),
            &description(),
            amount("100.00"),
            &category(),
            None,
            &units,
        )
        .unwrap();

        assert_eq!(
            shares_of(&charges),
            [amount("50.00"), amount("30.00"), amount("20.00")],
        );
    }

    #[test]
    fn last_unit_absorbs_rounding_remainder() {
        let units = [
            share(Some("33.33"), true),
            share(Some("33.33"), true),
            share(Some("33.34"), true),
        ];

        let charges = prorate(
            period::Id::new(),
            &description(),
            amount("100.00"),
            &category(),
            None,
            &units,
        )
        .unwrap();

        let total: Amount = charges.iter().map(|c| c.amount).sum();
        assert_eq!(total, amount("100.00"));
        assert_eq!(charges[0].amount, amount("33.33"));
        assert_eq!(charges[1].amount, amount("33.33"));
        assert_eq!(charges[2].amount, amount("33.34"));
    }

    #[test]
    fn sum_is_exact_for_awkward_amounts() {
        let units = [
            share(Some("33.33"), true),
            share(Some("33.33"), false),
            share(Some("33.34"), true),
        ];

        for pool in ["100.01", "0.05", "999.99", "7.77"] {
            let charges = prorate(
                period::Id::new(),
                &description(),
                amount(pool),
                &category(),
                None,
                &units,
            )
            .unwrap();

            let total: Amount = charges.iter().map(|c| c.amount).sum();
            assert_eq!(total, amount(pool), "drifted for pool {pool}");
        }
    }

    #[test]
    fn is_deterministic() {
        let units = [
            share(Some("12.5"), true),
            share(Some("41.7"), false),
            share(Some("45.8"), true),
        ];
        let run = || {
            shares_of(
                &prorate(
                    period::Id::new(),
                    &description(),
                    amount("123.45"),
                    &category(),
                    None,
                    &units,
                )
                .unwrap(),
            )
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn missing_weight_falls_back_to_one_equal_share() {
        let units =
            [share(Some("50"), true), share(None, true), share(Some("0"), true)];

        let charges = prorate(
            period::Id::new(),
            &description(),
            amount("52.00"),
            &category(),
            None,
            &units,
        )
        .unwrap();

        // Total weight is 50 + 1 + 1 = 52.
        assert_eq!(
            shares_of(&charges),
            [amount("50.00"), amount("1.00"), amount("1.00")],
        );
    }

    #[test]
    fn all_zero_weights_split_equally() {
        let units = [
            share(None, true),
            share(Some("0"), true),
            share(None, false),
            share(Some("0"), false),
        ];

        let charges = prorate(
            period::Id::new(),
            &description(),
            amount("100.00"),
            &category(),
            None,
            &units,
        )
        .unwrap();

        assert_eq!(
            shares_of(&charges),
            [
                amount("25.00"),
                amount("25.00"),
                amount("25.00"),
                amount("25.00"),
            ],
        );
    }

    #[test]
    fn fails_without_units() {
        assert_eq!(
            prorate(
                period::Id::new(),
                &description(),
                amount("100.00"),
                &category(),
                None,
                &[],
            )
            .unwrap_err(),
            Error::NoUsableWeights,
        );
    }

    #[test]
    fn derives_payer_kind_from_occupancy() {
        let units = [share(Some("60"), true), share(Some("40"), false)];

        let charges = prorate(
            period::Id::new(),
            &description(),
            amount("10.00"),
            &category(),
            None,
            &units,
        )
        .unwrap();

        assert_eq!(charges[0].payer_kind, charge::PayerKind::Resident);
        assert_eq!(charges[1].payer_kind, charge::PayerKind::Construction);
    }

    #[test]
    fn expands_reserve_and_requests() {
        let units = [share(Some("50"), true), share(Some("50"), false)];
        let requests = [
            Request {
                description: description(),
                amount: amount("30.00"),
                category: category(),
                prorateable: true,
                unit_id: None,
                receipt_text: None,
            },
            Request {
                description: charge::Description::new("Broken window")
                    .unwrap(),
                amount: amount("15.00"),
                category: charge::Category::new("REPAIR").unwrap(),
                prorateable: false,
                unit_id: Some(units[1].id),
                receipt_text: None,
            },
        ];

        let charges = expand(
            period::Id::new(),
            amount("100.00"),
            &requests,
            &units,
        )
        .unwrap();

        // Reserve and the prorateable request expand to one row per unit;
        // the fixed request stays a single row.
        assert_eq!(charges.len(), 5);

        let total: Amount = charges.iter().map(|c| c.amount).sum();
        assert_eq!(total, amount("145.00"));

        let reserve_total: Amount = charges
            .iter()
            .filter(|c| c.category == charge::Category::reserve())
            .map(|c| c.amount)
            .sum();
        assert_eq!(reserve_total, amount("100.00"));

        let fixed = charges.iter().find(|c| !c.prorated).unwrap();
        assert_eq!(fixed.unit_id, Some(units[1].id));
        assert_eq!(fixed.payer_kind, charge::PayerKind::Construction);
    }

    #[test]
    fn fixed_request_requires_a_building_unit() {
        let units = [share(Some("100"), true)];
        let request = |unit_id| Request {
            description: description(),
            amount: amount("15.00"),
            category: category(),
            prorateable: false,
            unit_id,
            receipt_text: None,
        };

        assert_eq!(
            expand(period::Id::new(), Amount::ZERO, &[request(None)], &units)
                .unwrap_err(),
            Error::MissingUnit,
        );

        let foreign = unit::Id::new();
        assert_eq!(
            expand(
                period::Id::new(),
                Amount::ZERO,
                &[request(Some(foreign))],
                &units,
            )
            .unwrap_err(),
            Error::UnitNotInBuilding(foreign),
        );
    }

    #[test]
    fn rejects_zero_amount_requests() {
        let units = [share(Some("100"), true)];
        let requests = [Request {
            description: description(),
            amount: Amount::ZERO,
            category: category(),
            prorateable: true,
            unit_id: None,
            receipt_text: None,
        }];

        assert_eq!(
            expand(period::Id::new(), Amount::ZERO, &requests, &units)
                .unwrap_err(),
            Error::InvalidAmount,
        );
    }
}

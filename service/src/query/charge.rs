//! [`Query`] collection related to [`Charge`]s.

use common::operations::By;

use crate::{
    domain::{charge, period, unit, Charge},
    read,
};
#[cfg(doc)]
use crate::{domain::Period, Query};

use super::DatabaseQuery;

/// Queries a [`read::charge::Balance`] by ID of its [`Charge`].
pub type BalanceById =
    DatabaseQuery<By<Option<read::charge::Balance>, charge::Id>>;

/// Queries all [`Charge`]s of a [`Period`].
pub type ForPeriod = DatabaseQuery<By<Vec<Charge>, period::Id>>;

/// Queries [`read::charge::Balance`]s of a single housing unit within a
/// [`Period`].
pub type ForUnitInPeriod = DatabaseQuery<
    By<Vec<read::charge::Balance>, (period::Id, unit::Id)>,
>;

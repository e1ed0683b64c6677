//! [`Query`] collection related to [`Period`]s.

use common::operations::By;

use crate::{
    domain::{building, period, Period},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Period`] by its [`period::Id`].
pub type ById = DatabaseQuery<By<Option<Period>, period::Id>>;

/// Queries administrator-facing [`read::period::Summary`]s of a building,
/// optionally filtered by a billing cycle range, newest first.
pub type Summaries = DatabaseQuery<
    By<Vec<read::period::Summary>, (building::Id, read::period::CycleRange)>,
>;

/// Queries resident-facing [`read::period::UnitSummary`]s of a single
/// housing unit, newest first.
pub type UnitSummaries = DatabaseQuery<
    By<Vec<read::period::UnitSummary>, read::period::UnitCycles>,
>;

//! [`Query`] collection related to [`Revision`]s.

use common::operations::By;

use crate::domain::{period, Revision};
#[cfg(doc)]
use crate::{domain::Period, Query};

use super::DatabaseQuery;

/// Queries the audit [`Revision`]s of a [`Period`], newest first.
pub type ForPeriod = DatabaseQuery<By<Vec<Revision>, period::Id>>;

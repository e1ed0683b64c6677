//! [`Query`] collection related to [`Payment`]s.

use common::operations::By;

use crate::domain::{charge, Payment};
#[cfg(doc)]
use crate::{domain::Charge, Query};

use super::DatabaseQuery;

/// Queries all [`Payment`]s applied to a [`Charge`], newest first.
pub type ForCharge = DatabaseQuery<By<Vec<Payment>, charge::Id>>;

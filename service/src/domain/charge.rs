//! [`Charge`] definitions.

use common::{define_kind, Amount};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{period, unit};

/// One monetary obligation attributed to a housing unit within a
/// [`Period`].
///
/// [`Charge`]s are created exclusively by period generation or charge
/// addition and are immutable once persisted.
///
/// [`Period`]: super::Period
#[derive(Clone, Debug)]
pub struct Charge {
    /// ID of this [`Charge`].
    pub id: Id,

    /// ID of the [`Period`] owning this [`Charge`].
    ///
    /// [`Period`]: super::Period
    pub period_id: period::Id,

    /// ID of the housing unit this [`Charge`] is billed to.
    pub unit_id: Option<unit::Id>,

    /// Human-readable [`Description`] of this [`Charge`].
    pub description: Description,

    /// [`Amount`] of this [`Charge`].
    pub amount: Amount,

    /// Free-form [`Category`] of this [`Charge`] (e.g. `RESERVE`,
    /// `MAINTENANCE`).
    pub category: Category,

    /// Indicates whether this [`Charge`] was derived by prorating a
    /// pool-level amount across the building's units.
    pub prorated: bool,

    /// Who is expected to pay this [`Charge`].
    pub payer_kind: PayerKind,

    /// Free text to render on the payment receipt, if any.
    pub receipt_text: Option<ReceiptText>,
}

/// ID of a [`Charge`].
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

/// Description of a [`Charge`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is valid, trimming
    /// surrounding whitespace.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty() && text.len() <= 512)
            .then(|| Self(text.to_owned()))
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// Free-form category of a [`Charge`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Category(String);

impl Category {
    /// [`Category`] of reserve fund [`Charge`]s generated alongside a
    /// billing period.
    #[must_use]
    pub fn reserve() -> Self {
        Self("RESERVE".to_owned())
    }

    /// Creates a new [`Category`] if the given `name` is valid, trimming
    /// surrounding whitespace.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref().trim();
        (!name.is_empty() && name.len() <= 64).then(|| Self(name.to_owned()))
    }
}

impl FromStr for Category {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Category`")
    }
}

/// Free text rendered on a payment receipt.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ReceiptText(String);

impl ReceiptText {
    /// Creates a new [`ReceiptText`] if the given `text` is non-blank.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty()).then(|| Self(text.to_owned()))
    }
}

impl FromStr for ReceiptText {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ReceiptText`")
    }
}

define_kind! {
    #[doc = "Who is expected to pay a [`Charge`]."]
    enum PayerKind {
        #[doc = "The unit has an active resident who pays the charge."]
        Resident = 1,

        #[doc = "The unit has no occupant yet, so the building or \
                 developer pays the charge."]
        Construction = 2,
    }
}

impl PayerKind {
    /// Derives the [`PayerKind`] from a unit's occupancy.
    #[must_use]
    pub fn from_occupancy(has_active_resident: bool) -> Self {
        if has_active_resident {
            Self::Resident
        } else {
            Self::Construction
        }
    }
}

//! [`Payment`] definitions.

use common::{define_kind, unit as marker, Amount, DateOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{charge, unit, user};

pub use super::charge::ReceiptText;

/// A monetary settlement applied against exactly one [`Charge`].
///
/// Immutable once persisted. For any charge, the sum of its [`Payment`]s
/// never exceeds the charge amount.
///
/// [`Charge`]: super::Charge
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the housing unit whose [`Charge`] is being settled.
    pub unit_id: Option<unit::Id>,

    /// ID of the [`Charge`] this [`Payment`] settles.
    ///
    /// [`Charge`]: super::Charge
    pub charge_id: charge::Id,

    /// ID of the paying user, if known.
    pub user_id: Option<user::Id>,

    /// [`Date`] when this [`Payment`] was issued.
    ///
    /// [`Date`]: common::Date
    pub issued_at: IssuanceDate,

    /// [`Amount`] of this [`Payment`].
    pub amount: Amount,

    /// [`Method`] this [`Payment`] was made with.
    pub method: Method,

    /// External [`Reference`] of this [`Payment`], if any.
    pub reference: Option<Reference>,

    /// [`Status`] of this [`Payment`].
    pub status: Status,

    /// Free text to render on the receipt, if any.
    pub receipt_text: Option<ReceiptText>,
}

/// ID of a [`Payment`].
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

/// Method a [`Payment`] was made with (e.g. `TRANSFER`, `CASH`).
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Method(String);

impl Method {
    /// Creates a new [`Method`] if the given `name` is valid, trimming
    /// surrounding whitespace.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref().trim();
        (!name.is_empty() && name.len() <= 64).then(|| Self(name.to_owned()))
    }
}

impl FromStr for Method {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Method`")
    }
}

/// External reference of a [`Payment`] (bank transaction number and
/// the like).
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Reference(String);

impl Reference {
    /// Creates a new [`Reference`] if the given `text` is non-blank.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty() && text.len() <= 128)
            .then(|| Self(text.to_owned()))
    }
}

impl FromStr for Reference {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Reference`")
    }
}

define_kind! {
    #[doc = "Status of a [`Payment`]."]
    enum Status {
        #[doc = "The [`Payment`] is confirmed and counts towards the \
                 charge's balance."]
        Confirmed = 1,
    }
}

/// [`Date`] when a [`Payment`] was issued.
///
/// [`Date`]: common::Date
pub type IssuanceDate = DateOf<(Payment, marker::Issuance)>;

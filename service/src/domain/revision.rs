//! [`Revision`] definitions.

use common::{define_kind, unit as marker, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{period, user};

/// Append-only audit line recorded for every mutation of a [`Period`].
///
/// [`Period`]: super::Period
#[derive(Clone, Debug)]
pub struct Revision {
    /// ID of this [`Revision`].
    pub id: Id,

    /// ID of the [`Period`] this [`Revision`] belongs to.
    ///
    /// [`Period`]: super::Period
    pub period_id: period::Id,

    /// ID of the user who performed the mutation, if known.
    pub author_id: Option<user::Id>,

    /// [`Action`] performed on the [`Period`].
    ///
    /// [`Period`]: super::Period
    pub action: Action,

    /// Free-form [`Note`] attached by the author, if any.
    pub note: Option<Note>,

    /// Machine-readable summary of the mutation (e.g. `charges=12`).
    pub detail: String,

    /// [`DateTime`] when this [`Revision`] was recorded.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

/// ID of a [`Revision`].
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

define_kind! {
    #[doc = "Action recorded by a [`Revision`]."]
    enum Action {
        #[doc = "The period was generated."]
        Created = 1,

        #[doc = "Charges were added to the period."]
        Updated = 2,
    }
}

/// Free-form note attached to a [`Revision`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Note(String);

impl Note {
    /// Creates a new [`Note`] if the given `text` is non-blank.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty() && text.len() <= 512)
            .then(|| Self(text.to_owned()))
    }
}

impl FromStr for Note {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Note`")
    }
}

/// [`DateTime`] when a [`Revision`] was recorded.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Revision, marker::Creation)>;

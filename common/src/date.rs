//! Calendar date utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{cmp::Ordering, fmt, marker::PhantomData, str::FromStr};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{
    format_description::BorrowedFormatItem, macros::format_description,
};

/// Format of a [`Date`] textual representation (`YYYY-MM-DD`).
const FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]");

/// Untyped calendar date.
pub type Date = DateOf;

/// Calendar date without a time-of-day component.
#[derive(Debug)]
pub struct DateOf<Of: ?Sized = ()> {
    /// Inner representation of the date.
    inner: time::Date,

    /// Type parameter describing the kind of date.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateOf<Of> {
    /// Creates a new [`Date`] representing the current date in UTC.
    #[must_use]
    pub fn today() -> Self {
        Self {
            inner: time::OffsetDateTime::now_utc().date(),
            _of: PhantomData,
        }
    }

    /// Coerces one kind of [`Date`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateOf<NewOf> {
        DateOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> fmt::Display for DateOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .inner
            .format(FORMAT)
            .unwrap_or_else(|e| panic!("cannot format `Date`: {e}"));
        write!(f, "{formatted}")
    }
}

impl<Of: ?Sized> FromStr for DateOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, FORMAT)
            .map(|inner| Self {
                inner,
                _of: PhantomData,
            })
            .map_err(ParseError)
    }
}

/// Error of parsing a [`Date`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("cannot parse `Date`: {_0}")]
pub struct ParseError(time::error::Parse);

impl<Of: ?Sized> Copy for DateOf<Of> {}
impl<Of: ?Sized> Clone for DateOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateOf<Of> {}
impl<Of: ?Sized> PartialEq for DateOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> From<time::Date> for DateOf<Of> {
    fn from(inner: time::Date) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> From<DateOf<Of>> for time::Date {
    fn from(date: DateOf<Of>) -> Self {
        date.inner
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateOf<Of> {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Into::into)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateOf<Of> {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "serde")]
pub mod serde {
    //! Module providing integration with [`serde`] crate.

    pub mod iso8601 {
        //! Serialization and deserialization of a [`DateOf`] as a
        //! `YYYY-MM-DD` string.

        use std::str::FromStr as _;

        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        use super::super::DateOf;

        /// Serializes the [`DateOf`] as a `YYYY-MM-DD` string.
        ///
        /// # Errors
        ///
        /// Never errors.
        pub fn serialize<Of, S>(
            date: &DateOf<Of>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
            Of: ?Sized,
        {
            serializer.serialize_str(&date.to_string())
        }

        /// Deserializes a `YYYY-MM-DD` string into a [`DateOf`].
        ///
        /// # Errors
        ///
        /// Returns an error if the string is not a valid date.
        pub fn deserialize<'de, D, Of>(
            deserializer: D,
        ) -> Result<DateOf<Of>, D::Error>
        where
            D: Deserializer<'de>,
            Of: ?Sized,
        {
            DateOf::from_str(&String::deserialize(deserializer)?)
                .map_err(Error::custom)
        }

        /// Same as the parent module, for [`Option`]al [`DateOf`]s.
        pub mod option {
            //! Serialization and deserialization of an optional [`DateOf`].

            use std::str::FromStr as _;

            use serde::{de::Error, Deserialize, Deserializer, Serializer};

            use super::DateOf;

            /// Serializes the optional [`DateOf`] as a `YYYY-MM-DD` string
            /// or `null`.
            ///
            /// # Errors
            ///
            /// Never errors.
            pub fn serialize<Of, S>(
                date: &Option<DateOf<Of>>,
                serializer: S,
            ) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
                Of: ?Sized,
            {
                match date {
                    Some(d) => serializer.serialize_some(&d.to_string()),
                    None => serializer.serialize_none(),
                }
            }

            /// Deserializes a `YYYY-MM-DD` string or `null` into an
            /// optional [`DateOf`].
            ///
            /// # Errors
            ///
            /// Returns an error if the string is not a valid date.
            pub fn deserialize<'de, D, Of>(
                deserializer: D,
            ) -> Result<Option<DateOf<Of>>, D::Error>
            where
                D: Deserializer<'de>,
                Of: ?Sized,
            {
                Option::<String>::deserialize(deserializer)?
                    .map(|raw| DateOf::from_str(&raw).map_err(Error::custom))
                    .transpose()
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Date;

    #[test]
    fn round_trips_through_text() {
        let date = Date::from_str("2026-08-01").unwrap();
        assert_eq!(date.to_string(), "2026-08-01");

        assert!(Date::from_str("2026-13-01").is_err());
        assert!(Date::from_str("not-a-date").is_err());
    }

    #[test]
    fn orders_chronologically() {
        let earlier = Date::from_str("2026-07-31").unwrap();
        let later = Date::from_str("2026-08-01").unwrap();
        assert!(earlier < later);
    }
}

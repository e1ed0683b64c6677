//! [`Error`]-related definitions.

use std::fmt;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::Serialize;
use service::{command, infra::database, proration};
use tracerr::{Trace, Traced};

/// REST API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
        }
    }

    /// Creates a new [`Error`] representing an invalid request.
    #[must_use]
    pub fn bad_request(code: Code, msg: &impl ToString) -> Self {
        Self {
            code,
            status_code: http::StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            backtrace: None,
        }
    }

    /// Creates a new [`Error`] representing a missing resource.
    #[must_use]
    pub fn not_found(code: Code, msg: &impl ToString) -> Self {
        Self {
            code,
            status_code: http::StatusCode::NOT_FOUND,
            message: msg.to_string(),
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        /// Serializable body of an erroneous response.
        #[derive(Serialize)]
        struct Body<'e> {
            /// [`Error`] code.
            code: Code,

            /// [`Error`] message.
            message: &'e str,
        }

        if self.status_code.is_server_error() {
            tracing::error!("{self}");
        }

        (
            self.status_code,
            Json(Body {
                code: self.code,
                message: &self.message,
            }),
        )
            .into_response()
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for proration::Error {
    fn try_as_error(&self) -> Option<Error> {
        use proration::Error as E;

        let code = match self {
            E::InvalidAmount => "INVALID_AMOUNT",
            E::MissingUnit => "MISSING_UNIT",
            E::NegativeRemainder | E::NoUsableWeights => "INVALID_CHARGES",
            E::UnitNotInBuilding(_) => "UNIT_NOT_IN_BUILDING",
        };
        Some(Error {
            code,
            status_code: http::StatusCode::BAD_REQUEST,
            message: self.to_string(),
            backtrace: None,
        })
    }
}

impl AsError for command::create_period::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::create_period::ExecutionError as E;

        match self {
            E::Db(_) => None,
            E::Expansion(e) => e.try_as_error(),
            E::PeriodAlreadyExists { .. } => Some(Error {
                code: "PERIOD_ALREADY_EXISTS",
                status_code: http::StatusCode::CONFLICT,
                message: self.to_string(),
                backtrace: None,
            }),
        }
    }
}

impl AsError for command::add_charges::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::add_charges::ExecutionError as E;

        let (code, status_code) = match self {
            E::Db(_) => return None,
            E::Expansion(e) => return e.try_as_error(),
            E::NoCharges => ("NO_CHARGES", http::StatusCode::BAD_REQUEST),
            E::PeriodClosed(_) => {
                ("PERIOD_CLOSED", http::StatusCode::CONFLICT)
            }
            E::PeriodNotExists(_) => {
                ("PERIOD_NOT_FOUND", http::StatusCode::NOT_FOUND)
            }
        };
        Some(Error {
            code,
            status_code,
            message: self.to_string(),
            backtrace: None,
        })
    }
}

impl AsError for command::pay_charge::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::pay_charge::ExecutionError as E;

        let (code, status_code) = match self {
            E::Db(_) => return None,
            E::AmountExceedsPending { .. } => {
                ("AMOUNT_EXCEEDS_PENDING", http::StatusCode::CONFLICT)
            }
            E::ChargeAlreadyPaid(_) => {
                ("CHARGE_ALREADY_PAID", http::StatusCode::CONFLICT)
            }
            E::ChargeNotExists(_) => {
                ("CHARGE_NOT_FOUND", http::StatusCode::NOT_FOUND)
            }
            E::InvalidAmount => {
                ("INVALID_AMOUNT", http::StatusCode::BAD_REQUEST)
            }
            E::UserNotResident(_) => {
                ("NOT_A_RESIDENT", http::StatusCode::FORBIDDEN)
            }
            E::UnitNotAuthorized(_) => {
                ("UNIT_NOT_AUTHORIZED", http::StatusCode::FORBIDDEN)
            }
        };
        Some(Error {
            code,
            status_code,
            message: self.to_string(),
            backtrace: None,
        })
    }
}

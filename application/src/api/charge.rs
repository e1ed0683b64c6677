//! [`Charge`]-related endpoints.
//!
//! [`Charge`]: domain::Charge

use axum::{extract::Path, Extension, Json};
use common::Amount;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use service::{
    command::AddCharges,
    domain::{self, charge, period, revision, unit, user},
    proration, query, read, Command as _,
};

use crate::{AsError as _, Error, Service};

/// Single charge line of a period generation or charge addition request.
#[derive(Debug, Deserialize)]
pub struct ChargeRequest {
    /// Human-readable description of the charge.
    pub description: String,

    /// [`Amount`] of the charge.
    pub amount: Amount,

    /// Free-form category of the charge.
    pub category: String,

    /// Indicates whether the amount should be prorated across the
    /// building's units. Non-prorateable charges bill the single unit
    /// named by `unit_id`.
    #[serde(default)]
    pub prorateable: bool,

    /// ID of the housing unit to bill, required for non-prorateable
    /// charges.
    #[serde(default)]
    pub unit_id: Option<unit::Id>,

    /// Free text to render on the payment receipt.
    #[serde(default)]
    pub receipt_text: Option<String>,
}

impl TryFrom<ChargeRequest> for proration::Request {
    type Error = Error;

    fn try_from(req: ChargeRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            description: charge::Description::new(&req.description)
                .ok_or_else(|| {
                    Error::bad_request(
                        "INVALID_DESCRIPTION",
                        &"charge `description` is blank or too long",
                    )
                })?,
            amount: req.amount,
            category: charge::Category::new(&req.category).ok_or_else(
                || {
                    Error::bad_request(
                        "INVALID_CATEGORY",
                        &"charge `category` is blank or too long",
                    )
                },
            )?,
            prorateable: req.prorateable,
            unit_id: req.unit_id,
            receipt_text: req
                .receipt_text
                .as_deref()
                .and_then(charge::ReceiptText::new),
        })
    }
}

/// Request body of the `POST /periods/:id/charges` endpoint.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    /// Charges to expand within the period.
    pub charges: Vec<ChargeRequest>,

    /// ID of the user adding the charges, if known.
    #[serde(default)]
    pub author_id: Option<user::Id>,

    /// Free-form note to record in the audit trail.
    #[serde(default)]
    pub note: Option<String>,
}

/// Serializable representation of a [`Charge`].
///
/// [`Charge`]: domain::Charge
#[derive(Debug, Serialize)]
pub struct Charge {
    /// ID of the charge.
    pub id: charge::Id,

    /// ID of the period owning the charge.
    pub period_id: period::Id,

    /// ID of the housing unit the charge is billed to.
    pub unit_id: Option<unit::Id>,

    /// Human-readable description of the charge.
    pub description: String,

    /// Amount of the charge.
    pub amount: Amount,

    /// Free-form category of the charge.
    pub category: String,

    /// Indicates whether the charge was derived by prorating a pool-level
    /// amount.
    pub prorated: bool,

    /// Who is expected to pay the charge.
    pub payer_kind: String,

    /// Free text to render on the payment receipt, if any.
    pub receipt_text: Option<String>,
}

impl From<domain::Charge> for Charge {
    fn from(charge: domain::Charge) -> Self {
        Self {
            id: charge.id,
            period_id: charge.period_id,
            unit_id: charge.unit_id,
            description: charge.description.to_string(),
            amount: charge.amount,
            category: charge.category.to_string(),
            prorated: charge.prorated,
            payer_kind: charge.payer_kind.to_string(),
            receipt_text: charge.receipt_text.map(|t| t.to_string()),
        }
    }
}

/// Serializable representation of a [`read::charge::Balance`].
#[derive(Debug, Serialize)]
pub struct Balance {
    /// The charge itself.
    #[serde(flatten)]
    pub charge: Charge,

    /// Calendar year of the charge's period.
    pub year: i16,

    /// Calendar month of the charge's period.
    pub month: i16,

    /// Due date of the charge's period.
    #[serde(with = "common::date::serde::iso8601")]
    pub due_date: period::DueDate,

    /// Status of the charge's period.
    pub period_status: String,

    /// Sum of confirmed payments applied to the charge.
    pub paid: Amount,

    /// Outstanding amount of the charge.
    pub pending: Amount,

    /// Settlement state of the charge.
    pub settlement: String,
}

impl From<read::charge::Balance> for Balance {
    fn from(balance: read::charge::Balance) -> Self {
        Self {
            year: balance.year.into(),
            month: balance.month.into(),
            due_date: balance.due_date,
            period_status: balance.period_status.to_string(),
            paid: balance.paid,
            pending: balance.pending(),
            settlement: balance.settlement().to_string(),
            charge: balance.charge.into(),
        }
    }
}

/// Handles the `POST /periods/:id/charges` endpoint adding charges to an
/// existing open billing period.
pub async fn add(
    Extension(service): Extension<Service>,
    Path(period_id): Path<period::Id>,
    Json(req): Json<AddRequest>,
) -> Result<(StatusCode, Json<Vec<Charge>>), Error> {
    let charges = req
        .charges
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<_>, _>>()?;

    let charges = service
        .execute(AddCharges {
            period_id,
            charges,
            author_id: req.author_id,
            note: req.note.as_deref().and_then(revision::Note::new),
        })
        .await
        .map_err(|e| e.into_error())?;

    Ok((
        StatusCode::CREATED,
        Json(charges.into_iter().map(Into::into).collect()),
    ))
}

/// Handles the `GET /periods/:id/charges` endpoint listing all the charges
/// of a billing period.
pub async fn of_period(
    Extension(service): Extension<Service>,
    Path(period_id): Path<period::Id>,
) -> Result<Json<Vec<Charge>>, Error> {
    let charges = service
        .execute(query::charge::ForPeriod::by(period_id))
        .await
        .map_err(|e| e.into_error())?;

    Ok(Json(charges.into_iter().map(Into::into).collect()))
}

/// Handles the `GET /periods/:id/units/:unit_id/charges` endpoint listing
/// the balances of a single housing unit within a billing period.
///
/// Charges billed to the building or developer are omitted, since a
/// resident can neither see nor settle them.
pub async fn of_unit_in_period(
    Extension(service): Extension<Service>,
    Path((period_id, unit_id)): Path<(period::Id, unit::Id)>,
) -> Result<Json<Vec<Balance>>, Error> {
    let balances = service
        .execute(query::charge::ForUnitInPeriod::by((period_id, unit_id)))
        .await
        .map_err(|e| e.into_error())?;

    Ok(Json(
        balances
            .into_iter()
            .filter(|b| b.charge.payer_kind == charge::PayerKind::Resident)
            .map(Into::into)
            .collect(),
    ))
}

/// Handles the `GET /charges/:id` endpoint.
pub async fn by_id(
    Extension(service): Extension<Service>,
    Path(id): Path<charge::Id>,
) -> Result<Json<Balance>, Error> {
    service
        .execute(query::charge::BalanceById::by(id))
        .await
        .map_err(|e| e.into_error())?
        .map(Into::into)
        .map(Json)
        .ok_or_else(|| {
            Error::not_found(
                "CHARGE_NOT_FOUND",
                &format!("`Charge(id: {id})` doesn't exist"),
            )
        })
}

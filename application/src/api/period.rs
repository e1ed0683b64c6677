//! [`Period`]-related endpoints.
//!
//! [`Period`]: domain::Period

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use common::Amount;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use service::{
    command::CreatePeriod,
    domain::{self, building, period, revision, unit, user},
    query, read, Command as _,
};

use crate::{api::charge::ChargeRequest, AsError as _, Error, Service};

/// Request body of the `POST /periods` endpoint.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    /// ID of the building to generate the billing period for.
    pub building_id: building::Id,

    /// Calendar year of the new period.
    pub year: i16,

    /// Calendar month of the new period.
    pub month: i16,

    /// Date when the generated charges are due.
    #[serde(with = "common::date::serde::iso8601")]
    pub due_date: period::DueDate,

    /// Reserve fund [`Amount`] to prorate across the building's units.
    pub reserve_amount: Amount,

    /// Charges to expand within the new period.
    #[serde(default)]
    pub charges: Vec<ChargeRequest>,

    /// ID of the user generating the period, if known.
    #[serde(default)]
    pub author_id: Option<user::Id>,

    /// Free-form note to record in the audit trail.
    #[serde(default)]
    pub note: Option<String>,
}

/// Serializable representation of a [`Period`].
///
/// [`Period`]: domain::Period
#[derive(Debug, Serialize)]
pub struct Period {
    /// ID of the period.
    pub id: period::Id,

    /// ID of the building the period belongs to.
    pub building_id: building::Id,

    /// Calendar year of the period.
    pub year: i16,

    /// Calendar month of the period.
    pub month: i16,

    /// Date when the period was generated.
    #[serde(with = "common::date::serde::iso8601")]
    pub generated_at: period::GenerationDate,

    /// Date when the period's charges are due.
    #[serde(with = "common::date::serde::iso8601")]
    pub due_date: period::DueDate,

    /// Reserve fund amount of the period.
    pub reserve_amount: Amount,

    /// Total amount of all the period's charges.
    pub total_amount: Amount,

    /// Status of the period.
    pub status: String,
}

impl From<domain::Period> for Period {
    fn from(period: domain::Period) -> Self {
        Self {
            id: period.id,
            building_id: period.building_id,
            year: period.year.into(),
            month: period.month.into(),
            generated_at: period.generated_at,
            due_date: period.due_date,
            reserve_amount: period.reserve_amount,
            total_amount: period.total_amount,
            status: period.status.to_string(),
        }
    }
}

/// Serializable representation of a [`Revision`].
///
/// [`Revision`]: domain::Revision
#[derive(Debug, Serialize)]
pub struct Revision {
    /// ID of the revision.
    pub id: revision::Id,

    /// ID of the author of the revision, if known.
    pub author_id: Option<user::Id>,

    /// Action recorded by the revision.
    pub action: String,

    /// Free-form note attached by the author, if any.
    pub note: Option<String>,

    /// Machine-readable summary of the mutation.
    pub detail: String,

    /// Timestamp when the revision was recorded.
    #[serde(serialize_with = "common::datetime::serde::rfc3339::serialize")]
    pub created_at: revision::CreationDateTime,
}

impl From<domain::Revision> for Revision {
    fn from(revision: domain::Revision) -> Self {
        Self {
            id: revision.id,
            author_id: revision.author_id,
            action: revision.action.to_string(),
            note: revision.note.map(|n| n.to_string()),
            detail: revision.detail,
            created_at: revision.created_at,
        }
    }
}

/// Serializable representation of a [`read::period::Summary`].
#[derive(Debug, Serialize)]
pub struct Summary {
    /// ID of the period.
    pub id: period::Id,

    /// Calendar year of the period.
    pub year: i16,

    /// Calendar month of the period.
    pub month: i16,

    /// Date when the period's charges are due.
    #[serde(with = "common::date::serde::iso8601")]
    pub due_date: period::DueDate,

    /// Reserve fund amount of the period.
    pub reserve_amount: Amount,

    /// Total amount of all the period's charges.
    pub total_amount: Amount,

    /// Status of the period.
    pub status: String,

    /// Number of charges belonging to the period.
    pub charges_count: i64,

    /// Number of audit revisions recorded for the period.
    pub revisions_count: i64,

    /// Timestamp of the latest revision, if any.
    #[serde(
        serialize_with = "common::datetime::serde::rfc3339::option::serialize"
    )]
    pub last_revision_at: Option<revision::CreationDateTime>,
}

impl From<read::period::Summary> for Summary {
    fn from(summary: read::period::Summary) -> Self {
        Self {
            id: summary.id,
            year: summary.year.into(),
            month: summary.month.into(),
            due_date: summary.due_date,
            reserve_amount: summary.reserve_amount,
            total_amount: summary.total_amount,
            status: summary.status.to_string(),
            charges_count: summary.charges_count,
            revisions_count: summary.revisions_count,
            last_revision_at: summary.last_revision_at,
        }
    }
}

/// Serializable representation of a [`read::period::UnitSummary`].
#[derive(Debug, Serialize)]
pub struct UnitSummary {
    /// ID of the period.
    pub id: period::Id,

    /// Calendar year of the period.
    pub year: i16,

    /// Calendar month of the period.
    pub month: i16,

    /// Date when the period's charges are due.
    #[serde(with = "common::date::serde::iso8601")]
    pub due_date: period::DueDate,

    /// Status of the period.
    pub status: String,

    /// Total amount billed to the unit within the period.
    pub total: Amount,

    /// Sum of confirmed payments made by the unit within the period.
    pub paid: Amount,

    /// Outstanding amount of the unit within the period.
    pub pending: Amount,

    /// Settlement state of the unit within the period.
    pub settlement: String,
}

impl From<read::period::UnitSummary> for UnitSummary {
    fn from(summary: read::period::UnitSummary) -> Self {
        Self {
            id: summary.id,
            year: summary.year.into(),
            month: summary.month.into(),
            due_date: summary.due_date,
            status: summary.status.to_string(),
            total: summary.total,
            paid: summary.paid,
            pending: summary.pending(),
            settlement: summary.settlement().to_string(),
        }
    }
}

/// Query string of billing cycle filtering endpoints.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct CycleFilter {
    /// Inclusive `YYYYMM` lower bound.
    #[serde(default)]
    pub from: Option<i32>,

    /// Inclusive `YYYYMM` upper bound.
    #[serde(default)]
    pub to: Option<i32>,
}

impl From<CycleFilter> for read::period::CycleRange {
    fn from(filter: CycleFilter) -> Self {
        Self {
            from: filter.from.map(Into::into),
            to: filter.to.map(Into::into),
        }
    }
}

/// Handles the `POST /periods` endpoint generating a new billing period
/// along with all its charges.
pub async fn create(
    Extension(service): Extension<Service>,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Period>), Error> {
    let year = period::Year::new(req.year).ok_or_else(|| {
        Error::bad_request(
            "INVALID_YEAR",
            &"`year` is out of the supported range",
        )
    })?;
    let month = period::Month::new(req.month).ok_or_else(|| {
        Error::bad_request("INVALID_MONTH", &"`month` must be within 1..=12")
    })?;
    let charges = req
        .charges
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<_>, _>>()?;

    let period = service
        .execute(CreatePeriod {
            building_id: req.building_id,
            year,
            month,
            due_date: req.due_date,
            reserve_amount: req.reserve_amount,
            charges,
            author_id: req.author_id,
            note: req.note.as_deref().and_then(revision::Note::new),
        })
        .await
        .map_err(|e| e.into_error())?;

    Ok((StatusCode::CREATED, Json(period.into())))
}

/// Handles the `GET /periods/:id` endpoint.
pub async fn by_id(
    Extension(service): Extension<Service>,
    Path(id): Path<period::Id>,
) -> Result<Json<Period>, Error> {
    service
        .execute(query::period::ById::by(id))
        .await
        .map_err(|e| e.into_error())?
        .map(Into::into)
        .map(Json)
        .ok_or_else(|| {
            Error::not_found(
                "PERIOD_NOT_FOUND",
                &format!("`Period(id: {id})` doesn't exist"),
            )
        })
}

/// Handles the `GET /periods/:id/revisions` endpoint listing the audit
/// trail of a billing period, newest first.
pub async fn revisions(
    Extension(service): Extension<Service>,
    Path(id): Path<period::Id>,
) -> Result<Json<Vec<Revision>>, Error> {
    let revisions = service
        .execute(query::revision::ForPeriod::by(id))
        .await
        .map_err(|e| e.into_error())?;

    Ok(Json(revisions.into_iter().map(Into::into).collect()))
}

/// Handles the `GET /buildings/:id/periods` endpoint listing
/// administrator-facing period summaries, newest first.
pub async fn summaries(
    Extension(service): Extension<Service>,
    Path(building_id): Path<building::Id>,
    Query(filter): Query<CycleFilter>,
) -> Result<Json<Vec<Summary>>, Error> {
    let summaries = service
        .execute(query::period::Summaries::by((building_id, filter.into())))
        .await
        .map_err(|e| e.into_error())?;

    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

/// Handles the `GET /buildings/:id/units/:unit_id/periods` endpoint
/// listing resident-facing period summaries of a single housing unit,
/// newest first.
pub async fn unit_summaries(
    Extension(service): Extension<Service>,
    Path((building_id, unit_id)): Path<(building::Id, unit::Id)>,
    Query(filter): Query<CycleFilter>,
) -> Result<Json<Vec<UnitSummary>>, Error> {
    let summaries = service
        .execute(query::period::UnitSummaries::by(read::period::UnitCycles {
            building_id,
            unit_id,
            range: filter.into(),
        }))
        .await
        .map_err(|e| e.into_error())?;

    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

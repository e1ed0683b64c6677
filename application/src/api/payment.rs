//! [`Payment`]-related endpoints.
//!
//! [`Payment`]: domain::Payment

use axum::{extract::Path, Extension, Json};
use common::Amount;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use service::{
    command::PayCharge,
    domain::{self, charge, payment, unit, user},
    query, Command as _,
};

use crate::{AsError as _, Error, Service};

/// Request body of the `POST /charges/:id/payments` endpoint.
#[derive(Debug, Deserialize)]
pub struct PayRequest {
    /// ID of the paying user.
    pub user_id: user::Id,

    /// [`Amount`] to pay.
    pub amount: Amount,

    /// Method the payment is made with.
    pub method: String,

    /// External reference of the payment.
    #[serde(default)]
    pub reference: Option<String>,

    /// Free text to render on the payment receipt.
    #[serde(default)]
    pub receipt_text: Option<String>,
}

/// Serializable representation of a [`Payment`].
///
/// [`Payment`]: domain::Payment
#[derive(Debug, Serialize)]
pub struct Payment {
    /// ID of the payment.
    pub id: payment::Id,

    /// ID of the housing unit whose charge is being settled.
    pub unit_id: Option<unit::Id>,

    /// ID of the charge the payment settles.
    pub charge_id: charge::Id,

    /// ID of the paying user, if known.
    pub user_id: Option<user::Id>,

    /// Date when the payment was issued.
    #[serde(with = "common::date::serde::iso8601")]
    pub issued_at: payment::IssuanceDate,

    /// Amount of the payment.
    pub amount: Amount,

    /// Method the payment was made with.
    pub method: String,

    /// External reference of the payment, if any.
    pub reference: Option<String>,

    /// Status of the payment.
    pub status: String,

    /// Free text to render on the receipt, if any.
    pub receipt_text: Option<String>,
}

impl From<domain::Payment> for Payment {
    fn from(payment: domain::Payment) -> Self {
        Self {
            id: payment.id,
            unit_id: payment.unit_id,
            charge_id: payment.charge_id,
            user_id: payment.user_id,
            issued_at: payment.issued_at,
            amount: payment.amount,
            method: payment.method.to_string(),
            reference: payment.reference.map(|r| r.to_string()),
            status: payment.status.to_string(),
            receipt_text: payment.receipt_text.map(|t| t.to_string()),
        }
    }
}

/// Handles the `POST /charges/:id/payments` endpoint settling (a part of)
/// a charge on behalf of a resident.
pub async fn pay(
    Extension(service): Extension<Service>,
    Path(charge_id): Path<charge::Id>,
    Json(req): Json<PayRequest>,
) -> Result<(StatusCode, Json<Payment>), Error> {
    let method = payment::Method::new(&req.method).ok_or_else(|| {
        Error::bad_request(
            "INVALID_METHOD",
            &"payment `method` is blank or too long",
        )
    })?;

    let payment = service
        .execute(PayCharge {
            charge_id,
            user_id: req.user_id,
            amount: req.amount,
            method,
            reference: req.reference.as_deref().and_then(payment::Reference::new),
            receipt_text: req
                .receipt_text
                .as_deref()
                .and_then(payment::ReceiptText::new),
        })
        .await
        .map_err(|e| e.into_error())?;

    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// Handles the `GET /charges/:id/payments` endpoint listing all the
/// payments applied to a charge, newest first.
pub async fn of_charge(
    Extension(service): Extension<Service>,
    Path(charge_id): Path<charge::Id>,
) -> Result<Json<Vec<Payment>>, Error> {
    let payments = service
        .execute(query::payment::ForCharge::by(charge_id))
        .await
        .map_err(|e| e.into_error())?;

    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

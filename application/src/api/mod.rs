//! REST API definitions.

pub mod charge;
pub mod payment;
pub mod period;

use axum::{
    routing::{get, post},
    Router,
};

/// Builds the [`Router`] serving the REST API.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/periods", post(period::create))
        .route("/periods/:id", get(period::by_id))
        .route(
            "/periods/:id/charges",
            get(charge::of_period).post(charge::add),
        )
        .route("/periods/:id/revisions", get(period::revisions))
        .route(
            "/periods/:id/units/:unit_id/charges",
            get(charge::of_unit_in_period),
        )
        .route("/buildings/:id/periods", get(period::summaries))
        .route(
            "/buildings/:id/units/:unit_id/periods",
            get(period::unit_summaries),
        )
        .route("/charges/:id", get(charge::by_id))
        .route(
            "/charges/:id/payments",
            get(payment::of_charge).post(payment::pay),
        )
}

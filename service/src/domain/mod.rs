//! Domain definitions.

pub mod building;
pub mod charge;
pub mod payment;
pub mod period;
pub mod revision;
pub mod unit;
pub mod user;

pub use self::{
    charge::Charge, payment::Payment, period::Period, revision::Revision,
};

//! [`Command`] definition.

pub mod add_charges;
pub mod create_period;
pub mod pay_charge;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    add_charges::AddCharges, create_period::CreatePeriod,
    pay_charge::PayCharge,
};

//! [`Command`] for generating a new [`Period`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Amount, Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        building, period, revision, user, Charge, Period, Revision,
    },
    infra::{database, Database},
    proration, read, Service,
};

use super::Command;

/// Name of the unique constraint guarding "one [`Period`] per building and
/// month".
const CYCLE_CONSTRAINT: &str = "expense_periods_building_cycle_key";

/// [`Command`] for generating a new [`Period`] along with all its
/// [`Charge`]s.
///
/// The reserve fund and every prorateable [`proration::Request`] are split
/// across the building's units by aliquot weight; fixed requests bill the
/// single unit they name. The whole expansion is persisted atomically,
/// together with a `Created` audit [`Revision`].
#[derive(Clone, Debug)]
pub struct CreatePeriod {
    /// ID of the building to generate a [`Period`] for.
    pub building_id: building::Id,

    /// Calendar [`period::Year`] of the new [`Period`].
    pub year: period::Year,

    /// Calendar [`period::Month`] of the new [`Period`].
    pub month: period::Month,

    /// [`Date`] when the generated [`Charge`]s are due.
    ///
    /// [`Date`]: common::Date
    pub due_date: period::DueDate,

    /// Reserve fund [`Amount`] to prorate across the building's units.
    pub reserve_amount: Amount,

    /// Charge [`proration::Request`]s to expand within the new [`Period`].
    pub charges: Vec<proration::Request>,

    /// ID of the [`user`] generating the [`Period`], if known.
    pub author_id: Option<user::Id>,

    /// Free-form [`revision::Note`] to record in the audit trail, if any.
    pub note: Option<revision::Note>,
}

impl<Db> Command<CreatePeriod> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Vec<read::unit::Share>, building::Id>>,
            Ok = Vec<read::unit::Share>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<Insert<Period>, Err = Traced<database::Error>>
        + Database<Insert<Vec<Charge>>, Err = Traced<database::Error>>
        + Database<Insert<Revision>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Period;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreatePeriod) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePeriod {
            building_id,
            year,
            month,
            due_date,
            reserve_amount,
            charges: requests,
            author_id,
            note,
        } = cmd;

        let units = self
            .database()
            .execute(Select(By::<Vec<read::unit::Share>, _>::new(building_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let period_id = period::Id::new();
        let charges =
            proration::expand(period_id, reserve_amount, &requests, &units)
                .map_err(tracerr::from_and_wrap!(=> E))?;

        let period = Period {
            id: period_id,
            building_id,
            year,
            month,
            generated_at: Date::today().coerce(),
            due_date,
            reserve_amount,
            total_amount: charges.iter().map(|c| c.amount).sum(),
            status: period::Status::Open,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Insert(period))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation(Some(CYCLE_CONSTRAINT)) {
                    tracerr::new!(E::PeriodAlreadyExists { year, month })
                } else {
                    tracerr::map_from_and_wrap!(=> E)(e)
                }
            })
            .map(drop)?;

        tx.execute(Insert(charges.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Insert(Revision {
            id: revision::Id::new(),
            period_id,
            author_id,
            action: revision::Action::Created,
            note,
            detail: format!("charges={}", charges.len()),
            created_at: DateTime::now().coerce(),
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "generated `Period(id: {})` for {year}-{month:02} with {} \
             charge(s)",
            period.id,
            charges.len(),
        );

        Ok(period)
    }
}

/// Error of [`CreatePeriod`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Charge requests couldn't be expanded into [`Charge`]s.
    #[display("failed to expand charges: {_0}")]
    #[from]
    Expansion(proration::Error),

    /// A [`Period`] for the same building and month already exists.
    #[display("a period for {year}-{month:02} already exists")]
    PeriodAlreadyExists {
        /// Calendar [`period::Year`] of the conflicting [`Period`].
        year: period::Year,

        /// Calendar [`period::Month`] of the conflicting [`Period`].
        month: period::Month,
    },
}

#[cfg(test)]
mod spec {
    use std::{
        str::FromStr as _,
        sync::{Arc, Mutex},
    };

    use common::{
        operations::{By, Commit, Insert, Select, Transact},
        Amount, Date, Weight,
    };
    use tracerr::Traced;

    use crate::{
        domain::{
            building, charge, period, revision, unit, Charge, Period,
            Revision,
        },
        infra::{database, Database},
        proration,
        read::unit::Share,
        Service,
    };

    use super::{
        Command as _, CreatePeriod, ExecutionError, CYCLE_CONSTRAINT,
    };

    /// In-memory [`Database`] stub driving a single building.
    #[derive(Clone, Debug)]
    struct Db(Arc<Mutex<State>>);

    #[derive(Debug)]
    struct State {
        units: Vec<Share>,
        duplicate_cycle: bool,
        period: Option<Period>,
        charges: Vec<Charge>,
        revisions: Vec<Revision>,
        committed: bool,
    }

    impl Database<Select<By<Vec<Share>, building::Id>>> for Db {
        type Ok = Vec<Share>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            _: Select<By<Vec<Share>, building::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(self.0.lock().unwrap().units.clone())
        }
    }

    impl Database<Transact> for Db {
        type Ok = Self;
        type Err = Traced<database::Error>;

        async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
            Ok(self.clone())
        }
    }

    impl Database<Insert<Period>> for Db {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Insert(period): Insert<Period>,
        ) -> Result<Self::Ok, Self::Err> {
            let mut state = self.0.lock().unwrap();
            if state.duplicate_cycle {
                return Err(tracerr::new!(
                    database::Error::UniqueViolation(
                        CYCLE_CONSTRAINT.to_owned(),
                    )
                ));
            }
            state.period = Some(period);
            Ok(())
        }
    }

    impl Database<Insert<Vec<Charge>>> for Db {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Insert(charges): Insert<Vec<Charge>>,
        ) -> Result<Self::Ok, Self::Err> {
            self.0.lock().unwrap().charges.extend(charges);
            Ok(())
        }
    }

    impl Database<Insert<Revision>> for Db {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Insert(revision): Insert<Revision>,
        ) -> Result<Self::Ok, Self::Err> {
            self.0.lock().unwrap().revisions.push(revision);
            Ok(())
        }
    }

    impl Database<Commit> for Db {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
            self.0.lock().unwrap().committed = true;
            Ok(())
        }
    }

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn share(weight: &str, occupied: bool) -> Share {
        Share {
            id: unit::Id::new(),
            weight: Some(Weight::from_str(weight).unwrap()),
            has_active_resident: occupied,
        }
    }

    fn request(
        sum: &str,
        prorateable: bool,
        unit_id: Option<unit::Id>,
    ) -> proration::Request {
        proration::Request {
            description: charge::Description::new("Cleaning").unwrap(),
            amount: amount(sum),
            category: charge::Category::new("MAINTENANCE").unwrap(),
            prorateable,
            unit_id,
            receipt_text: None,
        }
    }

    fn service(state: State) -> Service<Db> {
        Service::new(Db(Arc::new(Mutex::new(state))))
    }

    fn generate(
        building_id: building::Id,
        reserve: &str,
        charges: Vec<proration::Request>,
    ) -> CreatePeriod {
        CreatePeriod {
            building_id,
            year: period::Year::new(2026).unwrap(),
            month: period::Month::new(3).unwrap(),
            due_date: Date::today().coerce(),
            reserve_amount: amount(reserve),
            charges,
            author_id: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn persists_the_expansion_with_final_totals() {
        let units = vec![share("50", true), share("50", false)];
        let fixed_unit = units[1].id;
        let service = service(State {
            units,
            duplicate_cycle: false,
            period: None,
            charges: Vec::new(),
            revisions: Vec::new(),
            committed: false,
        });

        let period = service
            .execute(generate(
                building::Id::new(),
                "100.00",
                vec![
                    request("30.00", true, None),
                    request("15.00", false, Some(fixed_unit)),
                ],
            ))
            .await
            .unwrap();

        // Reserve and the prorateable request expand to one row per unit;
        // the fixed request stays a single row.
        assert_eq!(period.total_amount, amount("145.00"));
        assert_eq!(period.reserve_amount, amount("100.00"));
        assert_eq!(period.status, period::Status::Open);

        let db = service.database().0.lock().unwrap();
        assert_eq!(db.charges.len(), 5);
        let inserted: Amount = db.charges.iter().map(|c| c.amount).sum();
        assert_eq!(inserted, period.total_amount);
        assert_eq!(db.period.as_ref().unwrap().id, period.id);
        assert_eq!(db.revisions.len(), 1);
        assert_eq!(db.revisions[0].action, revision::Action::Created);
        assert_eq!(db.revisions[0].detail, "charges=5");
        assert!(db.committed);
    }

    #[tokio::test]
    async fn maps_a_duplicate_cycle_to_period_already_exists() {
        let service = service(State {
            units: vec![share("100", true)],
            duplicate_cycle: true,
            period: None,
            charges: Vec::new(),
            revisions: Vec::new(),
            committed: false,
        });

        let err = service
            .execute(generate(building::Id::new(), "100.00", Vec::new()))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PeriodAlreadyExists { .. },
        ));
        let db = service.database().0.lock().unwrap();
        assert!(db.charges.is_empty());
        assert!(!db.committed);
    }

    #[tokio::test]
    async fn fails_without_registered_units() {
        let service = service(State {
            units: Vec::new(),
            duplicate_cycle: false,
            period: None,
            charges: Vec::new(),
            revisions: Vec::new(),
            committed: false,
        });

        let err = service
            .execute(generate(building::Id::new(), "100.00", Vec::new()))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Expansion(proration::Error::NoUsableWeights),
        ));
    }
}

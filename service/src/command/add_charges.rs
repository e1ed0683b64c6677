//! [`Command`] for adding [`Charge`]s to an existing [`Period`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    Amount, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        building, period, revision, user, Charge, Period, Revision,
    },
    infra::{database, Database},
    proration, read, Service,
};

use super::Command;

/// [`Command`] for adding [`Charge`]s to an existing open [`Period`].
///
/// Prorateable [`proration::Request`]s are split across the building's
/// units the same way period generation does it. The period's running
/// total is bumped by the added amount within the same transaction, and an
/// `Updated` audit [`Revision`] is recorded.
#[derive(Clone, Debug)]
pub struct AddCharges {
    /// ID of the [`Period`] to add [`Charge`]s to.
    pub period_id: period::Id,

    /// Charge [`proration::Request`]s to expand.
    pub charges: Vec<proration::Request>,

    /// ID of the [`user`] adding the [`Charge`]s, if known.
    pub author_id: Option<user::Id>,

    /// Free-form [`revision::Note`] to record in the audit trail, if any.
    pub note: Option<revision::Note>,
}

impl<Db> Command<AddCharges> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Option<Period>, period::Id>>,
            Ok = Option<Period>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<read::unit::Share>, building::Id>>,
            Ok = Vec<read::unit::Share>,
            Err = Traced<database::Error>,
        > + Database<Insert<Vec<Charge>>, Err = Traced<database::Error>>
        + Database<Update<period::Totals>, Err = Traced<database::Error>>
        + Database<Insert<Revision>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vec<Charge>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: AddCharges) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddCharges {
            period_id,
            charges: requests,
            author_id,
            note,
        } = cmd;

        if requests.is_empty() {
            return Err(tracerr::new!(E::NoCharges));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes concurrent additions to the same `Period`, keeping its
        // running total consistent with the inserted charges.
        let period = tx
            .execute(Lock(By::<Option<Period>, _>::new(period_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PeriodNotExists(period_id))
            .map_err(tracerr::wrap!())?;
        if period.status == period::Status::Closed {
            return Err(tracerr::new!(E::PeriodClosed(period_id)));
        }

        let units = tx
            .execute(Select(By::<Vec<read::unit::Share>, _>::new(
                period.building_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let charges =
            proration::expand(period_id, Amount::ZERO, &requests, &units)
                .map_err(tracerr::from_and_wrap!(=> E))?;
        let added: Amount = charges.iter().map(|c| c.amount).sum();

        tx.execute(Insert(charges.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Update(period::Totals {
            id: period_id,
            total_amount: period.total_amount + added,
            reserve_amount: period.reserve_amount,
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        tx.execute(Insert(Revision {
            id: revision::Id::new(),
            period_id,
            author_id,
            action: revision::Action::Updated,
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

        Ok(charges)
    }
}

/// Error of [`AddCharges`] [`Command`] execution.
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

    /// There are no charge requests to add.
    #[display("no charges provided")]
    NoCharges,

    /// [`Period`] with the provided ID is closed for modifications.
    #[display("`Period(id: {_0})` is closed")]
    PeriodClosed(#[error(not(source))] period::Id),

    /// [`Period`] with the provided ID doesn't exist.
    #[display("`Period(id: {_0})` doesn't exist")]
    PeriodNotExists(#[error(not(source))] period::Id),
}

#[cfg(test)]
mod spec {
    use std::{
        str::FromStr as _,
        sync::{Arc, Mutex},
    };

    use common::{
        operations::{By, Commit, Insert, Lock, Select, Transact, Update},
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

    use super::{AddCharges, Command as _, ExecutionError};

    /// In-memory [`Database`] stub driving a single period.
    #[derive(Clone, Debug)]
    struct Db(Arc<Mutex<State>>);

    #[derive(Debug)]
    struct State {
        period: Option<Period>,
        units: Vec<Share>,
        charges: Vec<Charge>,
        totals: Option<period::Totals>,
        revisions: Vec<Revision>,
        committed: bool,
    }

    impl Database<Transact> for Db {
        type Ok = Self;
        type Err = Traced<database::Error>;

        async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
            Ok(self.clone())
        }
    }

    impl Database<Lock<By<Option<Period>, period::Id>>> for Db {
        type Ok = Option<Period>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            _: Lock<By<Option<Period>, period::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(self.0.lock().unwrap().period)
        }
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

    impl Database<Update<period::Totals>> for Db {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Update(totals): Update<period::Totals>,
        ) -> Result<Self::Ok, Self::Err> {
            self.0.lock().unwrap().totals = Some(totals);
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

    fn period(status: period::Status) -> Period {
        Period {
            id: period::Id::new(),
            building_id: building::Id::new(),
            year: period::Year::new(2026).unwrap(),
            month: period::Month::new(3).unwrap(),
            generated_at: Date::today().coerce(),
            due_date: Date::today().coerce(),
            reserve_amount: amount("50.00"),
            total_amount: amount("100.00"),
            status,
        }
    }

    fn request(sum: &str) -> proration::Request {
        proration::Request {
            description: charge::Description::new("Elevator repair").unwrap(),
            amount: amount(sum),
            category: charge::Category::new("REPAIR").unwrap(),
            prorateable: true,
            unit_id: None,
            receipt_text: None,
        }
    }

    fn service(state: State) -> Service<Db> {
        Service::new(Db(Arc::new(Mutex::new(state))))
    }

    fn add(period_id: period::Id, sums: &[&str]) -> AddCharges {
        AddCharges {
            period_id,
            charges: sums.iter().copied().map(request).collect(),
            author_id: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn adds_charges_and_bumps_the_running_total() {
        let period = period(period::Status::Open);
        let service = service(State {
            period: Some(period),
            units: vec![share("50", true), share("50", false)],
            charges: Vec::new(),
            totals: None,
            revisions: Vec::new(),
            committed: false,
        });

        let added = service
            .execute(add(period.id, &["30.00"]))
            .await
            .unwrap();

        assert_eq!(added.len(), 2);
        let sum: Amount = added.iter().map(|c| c.amount).sum();
        assert_eq!(sum, amount("30.00"));

        let db = service.database().0.lock().unwrap();
        assert_eq!(db.charges.len(), added.len());
        let totals = db.totals.unwrap();
        assert_eq!(totals.id, period.id);
        assert_eq!(totals.total_amount, amount("130.00"));
        assert_eq!(totals.reserve_amount, period.reserve_amount);
        assert_eq!(db.revisions.len(), 1);
        assert_eq!(db.revisions[0].action, revision::Action::Updated);
        assert_eq!(db.revisions[0].detail, "charges=2");
        assert!(db.committed);
    }

    #[tokio::test]
    async fn rejects_an_unknown_period() {
        let service = service(State {
            period: None,
            units: Vec::new(),
            charges: Vec::new(),
            totals: None,
            revisions: Vec::new(),
            committed: false,
        });

        let err = service
            .execute(add(period::Id::new(), &["30.00"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PeriodNotExists(_),
        ));
    }

    #[tokio::test]
    async fn rejects_a_closed_period() {
        let period = period(period::Status::Closed);
        let service = service(State {
            period: Some(period),
            units: vec![share("100", true)],
            charges: Vec::new(),
            totals: None,
            revisions: Vec::new(),
            committed: false,
        });

        let err = service
            .execute(add(period.id, &["30.00"]))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PeriodClosed(_)));
        let db = service.database().0.lock().unwrap();
        assert!(db.charges.is_empty());
        assert!(!db.committed);
    }

    #[tokio::test]
    async fn rejects_empty_requests() {
        let service = service(State {
            period: Some(period(period::Status::Open)),
            units: vec![share("100", true)],
            charges: Vec::new(),
            totals: None,
            revisions: Vec::new(),
            committed: false,
        });

        let err = service
            .execute(add(period::Id::new(), &[]))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NoCharges));
    }
}

//! [`Command`] for applying a [`Payment`] to a [`Charge`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Amount, Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{charge, payment, unit, user, Charge, Payment},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for applying a [`Payment`] to a [`Charge`].
///
/// `Resident` charges may only be paid by the user occupying the billed
/// unit, while `Construction` charges are settled by the building or
/// developer and skip the ownership check.
///
/// The charge row is locked before its balance is read, so two concurrent
/// payments against the same [`Charge`] serialize and can never settle
/// more than the charge amount in total.
#[derive(Clone, Debug)]
pub struct PayCharge {
    /// ID of the [`Charge`] to pay.
    pub charge_id: charge::Id,

    /// ID of the paying [`user`].
    pub user_id: user::Id,

    /// [`Amount`] to pay.
    pub amount: Amount,

    /// [`payment::Method`] the payment is made with.
    pub method: payment::Method,

    /// External [`payment::Reference`] of the payment, if any.
    pub reference: Option<payment::Reference>,

    /// Free text to render on the payment receipt, if any.
    pub receipt_text: Option<payment::ReceiptText>,
}

impl<Db> Command<PayCharge> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Option<Charge>, charge::Id>>,
            Ok = Option<Charge>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<unit::Id>, user::Id>>,
            Ok = Option<unit::Id>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Amount, charge::Id>>,
            Ok = Amount,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: PayCharge) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let PayCharge {
            charge_id,
            user_id,
            amount,
            method,
            reference,
            receipt_text,
        } = cmd;

        if amount.is_zero() {
            return Err(tracerr::new!(E::InvalidAmount));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes concurrent payments against the same `Charge`, so the
        // balance read below cannot go stale before the insert.
        let charge = tx
            .execute(Lock(By::<Option<Charge>, _>::new(charge_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ChargeNotExists(charge_id))
            .map_err(tracerr::wrap!())?;

        // Only `Resident` charges require the payer to occupy the billed
        // unit.
        if charge.payer_kind == charge::PayerKind::Resident {
            let unit_id = tx
                .execute(Select(By::<Option<unit::Id>, _>::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotResident(user_id))
                .map_err(tracerr::wrap!())?;
            if charge.unit_id != Some(unit_id) {
                return Err(tracerr::new!(E::UnitNotAuthorized(unit_id)));
            }
        }

        let paid = tx
            .execute(Select(By::<Amount, _>::new(charge_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let pending = charge.amount.checked_sub(paid).unwrap_or(Amount::ZERO);
        if pending.is_zero() {
            return Err(tracerr::new!(E::ChargeAlreadyPaid(charge_id)));
        }
        if amount > pending {
            return Err(tracerr::new!(E::AmountExceedsPending {
                requested: amount,
                pending,
            }));
        }

        let payment = Payment {
            id: payment::Id::new(),
            unit_id: charge.unit_id,
            charge_id,
            user_id: Some(user_id),
            issued_at: Date::today().coerce(),
            amount,
            method,
            reference,
            status: payment::Status::Confirmed,
            receipt_text,
        };
        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`PayCharge`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// The requested amount exceeds the charge's outstanding part.
    #[display("payment of {requested} exceeds the pending {pending}")]
    AmountExceedsPending {
        /// Requested payment [`Amount`].
        requested: Amount,

        /// Outstanding [`Amount`] of the [`Charge`].
        pending: Amount,
    },

    /// [`Charge`] with the provided ID is already fully paid.
    #[display("`Charge(id: {_0})` is already paid")]
    ChargeAlreadyPaid(#[error(not(source))] charge::Id),

    /// [`Charge`] with the provided ID doesn't exist.
    #[display("`Charge(id: {_0})` doesn't exist")]
    ChargeNotExists(#[error(not(source))] charge::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// The requested payment amount is zero.
    #[display("payment amount must be greater than zero")]
    InvalidAmount,

    /// The paying user doesn't actively occupy any housing unit.
    #[display("`User(id: {_0})` isn't an active resident")]
    UserNotResident(#[error(not(source))] user::Id),

    /// The charge doesn't belong to the payer's housing unit.
    #[display("`Unit(id: {_0})` isn't billed by the charge")]
    UnitNotAuthorized(#[error(not(source))] unit::Id),
}

#[cfg(test)]
mod spec {
    use std::{
        str::FromStr as _,
        sync::{Arc, Mutex},
    };

    use common::{
        operations::{By, Commit, Insert, Lock, Select, Transact},
        Amount, Date,
    };
    use tracerr::Traced;

    use crate::{
        domain::{charge, payment, unit, user, Charge, Payment},
        infra::{database, Database},
        Service,
    };

    use super::{Command as _, ExecutionError, PayCharge};

    /// In-memory [`Database`] stub driving a single charge.
    #[derive(Clone, Debug)]
    struct Db(Arc<Mutex<State>>);

    #[derive(Debug)]
    struct State {
        resident_unit: Option<unit::Id>,
        charge: Option<Charge>,
        paid: Amount,
        payments: Vec<Payment>,
        committed: bool,
    }

    impl Database<Select<By<Option<unit::Id>, user::Id>>> for Db {
        type Ok = Option<unit::Id>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            _: Select<By<Option<unit::Id>, user::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(self.0.lock().unwrap().resident_unit)
        }
    }

    impl Database<Transact> for Db {
        type Ok = Self;
        type Err = Traced<database::Error>;

        async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
            Ok(self.clone())
        }
    }

    impl Database<Lock<By<Option<Charge>, charge::Id>>> for Db {
        type Ok = Option<Charge>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            _: Lock<By<Option<Charge>, charge::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(self.0.lock().unwrap().charge.clone())
        }
    }

    impl Database<Select<By<Amount, charge::Id>>> for Db {
        type Ok = Amount;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            _: Select<By<Amount, charge::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(self.0.lock().unwrap().paid)
        }
    }

    impl Database<Insert<Payment>> for Db {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Insert(payment): Insert<Payment>,
        ) -> Result<Self::Ok, Self::Err> {
            self.0.lock().unwrap().payments.push(payment);
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

    fn charge(unit_id: unit::Id, total: &str) -> Charge {
        Charge {
            id: charge::Id::new(),
            period_id: crate::domain::period::Id::new(),
            unit_id: Some(unit_id),
            description: charge::Description::new("Cleaning").unwrap(),
            amount: amount(total),
            category: charge::Category::new("MAINTENANCE").unwrap(),
            prorated: true,
            payer_kind: charge::PayerKind::Resident,
            receipt_text: None,
        }
    }

    fn service(state: State) -> Service<Db> {
        Service::new(Db(Arc::new(Mutex::new(state))))
    }

    fn pay(charge_id: charge::Id, user_id: user::Id, sum: &str) -> PayCharge {
        PayCharge {
            charge_id,
            user_id,
            amount: amount(sum),
            method: payment::Method::new("TRANSFER").unwrap(),
            reference: None,
            receipt_text: None,
        }
    }

    #[tokio::test]
    async fn settles_a_pending_charge() {
        let unit_id = unit::Id::new();
        let user_id = user::Id::new();
        let charge = charge(unit_id, "100.00");
        let service = service(State {
            resident_unit: Some(unit_id),
            charge: Some(charge.clone()),
            paid: amount("40.00"),
            payments: Vec::new(),
            committed: false,
        });

        let payment = service
            .execute(pay(charge.id, user_id, "60.00"))
            .await
            .unwrap();

        assert_eq!(payment.charge_id, charge.id);
        assert_eq!(payment.amount, amount("60.00"));
        assert_eq!(payment.unit_id, Some(unit_id));
        assert_eq!(payment.user_id, Some(user_id));
        assert_eq!(payment.status, payment::Status::Confirmed);
        assert_eq!(payment.issued_at, Date::today().coerce());

        let db = service.database().0.lock().unwrap();
        assert_eq!(db.payments.len(), 1);
        assert!(db.committed);
    }

    #[tokio::test]
    async fn rejects_overpayment() {
        let unit_id = unit::Id::new();
        let charge = charge(unit_id, "100.00");
        let service = service(State {
            resident_unit: Some(unit_id),
            charge: Some(charge.clone()),
            paid: amount("40.00"),
            payments: Vec::new(),
            committed: false,
        });

        let err = service
            .execute(pay(charge.id, user::Id::new(), "60.01"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::AmountExceedsPending { .. },
        ));
        let db = service.database().0.lock().unwrap();
        assert!(db.payments.is_empty());
        assert!(!db.committed);
    }

    #[tokio::test]
    async fn rejects_an_already_paid_charge() {
        let unit_id = unit::Id::new();
        let charge = charge(unit_id, "100.00");
        let service = service(State {
            resident_unit: Some(unit_id),
            charge: Some(charge.clone()),
            paid: amount("100.00"),
            payments: Vec::new(),
            committed: false,
        });

        let err = service
            .execute(pay(charge.id, user::Id::new(), "0.01"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ChargeAlreadyPaid(_),
        ));
    }

    #[tokio::test]
    async fn rejects_a_charge_of_a_foreign_unit() {
        let charge = charge(unit::Id::new(), "100.00");
        let payer_unit = unit::Id::new();
        let service = service(State {
            resident_unit: Some(payer_unit),
            charge: Some(charge.clone()),
            paid: Amount::ZERO,
            payments: Vec::new(),
            committed: false,
        });

        let err = service
            .execute(pay(charge.id, user::Id::new(), "10.00"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::UnitNotAuthorized(id) if *id == payer_unit,
        ));
    }

    #[tokio::test]
    async fn accepts_any_payer_for_a_construction_charge() {
        let mut charge = charge(unit::Id::new(), "100.00");
        charge.payer_kind = charge::PayerKind::Construction;
        let service = service(State {
            resident_unit: None,
            charge: Some(charge.clone()),
            paid: Amount::ZERO,
            payments: Vec::new(),
            committed: false,
        });

        let payment = service
            .execute(pay(charge.id, user::Id::new(), "100.00"))
            .await
            .unwrap();

        assert_eq!(payment.unit_id, charge.unit_id);
        assert!(service.database().0.lock().unwrap().committed);
    }

    #[tokio::test]
    async fn records_the_provided_receipt_text() {
        let unit_id = unit::Id::new();
        let charge = charge(unit_id, "100.00");
        let service = service(State {
            resident_unit: Some(unit_id),
            charge: Some(charge.clone()),
            paid: Amount::ZERO,
            payments: Vec::new(),
            committed: false,
        });

        let receipt_text = payment::ReceiptText::new("March dues").unwrap();
        let mut cmd = pay(charge.id, user::Id::new(), "100.00");
        cmd.receipt_text = Some(receipt_text.clone());

        let payment = service.execute(cmd).await.unwrap();

        assert_eq!(payment.receipt_text, Some(receipt_text));
    }

    #[tokio::test]
    async fn rejects_a_non_resident_payer() {
        let charge = charge(unit::Id::new(), "100.00");
        let service = service(State {
            resident_unit: None,
            charge: Some(charge.clone()),
            paid: Amount::ZERO,
            payments: Vec::new(),
            committed: false,
        });

        let err = service
            .execute(pay(charge.id, user::Id::new(), "10.00"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotResident(_)));
    }

    #[tokio::test]
    async fn rejects_a_zero_amount() {
        let unit_id = unit::Id::new();
        let charge = charge(unit_id, "100.00");
        let service = service(State {
            resident_unit: Some(unit_id),
            charge: Some(charge.clone()),
            paid: Amount::ZERO,
            payments: Vec::new(),
            committed: false,
        });

        let err = service
            .execute(pay(charge.id, user::Id::new(), "0"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidAmount));
    }
}

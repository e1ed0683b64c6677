//! [`Charge`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select},
    Amount,
};
use itertools::Itertools as _;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{charge, payment, period, unit, Charge},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Reconstructs a [`Charge`] from the provided row, expecting all the
/// `charges` columns selected under their own names.
fn charge_from_row(row: &Row) -> Charge {
    Charge {
        id: row.get("id"),
        period_id: row.get("period_id"),
        unit_id: row.get("unit_id"),
        description: row.get("description"),
        amount: row.get("amount"),
        category: row.get("category"),
        prorated: row.get("prorated"),
        payer_kind: row.get("payer_kind"),
        receipt_text: row.get("receipt_text"),
    }
}

impl<C> Database<Insert<Vec<Charge>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(charges): Insert<Vec<Charge>>,
    ) -> Result<Self::Ok, Self::Err> {
        if charges.is_empty() {
            return Ok(());
        }

        #[expect(clippy::type_complexity, reason = "column vectors")]
        let (
            ids,
            period_ids,
            unit_ids,
            descriptions,
            amounts,
            categories,
            prorated,
            payer_kinds,
            receipt_texts,
        ): (
            Vec<charge::Id>,
            Vec<period::Id>,
            Vec<Option<unit::Id>>,
            Vec<charge::Description>,
            Vec<Amount>,
            Vec<charge::Category>,
            Vec<bool>,
            Vec<charge::PayerKind>,
            Vec<Option<charge::ReceiptText>>,
        ) = charges
            .into_iter()
            .map(|c| {
                (
                    c.id,
                    c.period_id,
                    c.unit_id,
                    c.description,
                    c.amount,
                    c.category,
                    c.prorated,
                    c.payer_kind,
                    c.receipt_text,
                )
            })
            .multiunzip();

        const SQL: &str = "\
            INSERT INTO charges (\
                id, period_id, unit_id, \
                description, amount, category, \
                prorated, payer_kind, \
                receipt_text\
            ) \
            SELECT * FROM UNNEST(\
                $1::UUID[], $2::UUID[], $3::UUID[], \
                $4::VARCHAR[], $5::NUMERIC[], $6::VARCHAR[], \
                $7::BOOL[], $8::INT2[], \
                $9::VARCHAR[]\
            )";
        self.exec(
            SQL,
            &[
                &ids,
                &period_ids,
                &unit_ids,
                &descriptions,
                &amounts,
                &categories,
                &prorated,
                &payer_kinds,
                &receipt_texts,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Charge>, period::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Charge>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Charge>, period::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let period_id: period::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, period_id, unit_id, \
                   description, amount, category, \
                   prorated, payer_kind, \
                   receipt_text \
            FROM charges \
            WHERE period_id = $1::UUID \
            ORDER BY id";
        Ok(self
            .query(SQL, &[&period_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(charge_from_row)
            .collect())
    }
}

impl<C> Database<Lock<By<Option<Charge>, charge::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Charge>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Option<Charge>, charge::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: charge::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, period_id, unit_id, \
                   description, amount, category, \
                   prorated, payer_kind, \
                   receipt_text \
            FROM charges \
            WHERE id = $1::UUID \
            FOR UPDATE";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(charge_from_row))
    }
}

/// Sum of confirmed payments applied to a single [`Charge`].
impl<C> Database<Select<By<Amount, charge::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Amount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Amount, charge::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let charge_id: charge::Id = by.into_inner();
        let confirmed = payment::Status::Confirmed;

        const SQL: &str = "\
            SELECT COALESCE(SUM(amount), 0) AS paid \
            FROM payments \
            WHERE charge_id = $1::UUID \
                  AND status = $2::INT2";
        Ok(self
            .query_opt(SQL, &[&charge_id, &confirmed])
            .await
            .map_err(tracerr::wrap!())?
            .map_or(Amount::ZERO, |row| row.get("paid")))
    }
}

impl<C> Database<Select<By<Option<read::charge::Balance>, charge::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<read::charge::Balance>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<read::charge::Balance>, charge::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: charge::Id = by.into_inner();
        let confirmed = payment::Status::Confirmed;

        const SQL: &str = "\
            SELECT c.id, c.period_id, c.unit_id, \
                   c.description, c.amount, c.category, \
                   c.prorated, c.payer_kind, \
                   c.receipt_text, \
                   p.year, p.month, p.due_date, \
                   p.status AS period_status, \
                   COALESCE((SELECT SUM(pm.amount) \
                             FROM payments pm \
                             WHERE pm.charge_id = c.id \
                                   AND pm.status = $2::INT2), 0) AS paid \
            FROM charges c \
            JOIN expense_periods p ON p.id = c.period_id \
            WHERE c.id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id, &confirmed])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(balance_from_row))
    }
}

impl<C>
    Database<Select<By<Vec<read::charge::Balance>, (period::Id, unit::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::charge::Balance>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<read::charge::Balance>, (period::Id, unit::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (period_id, unit_id) = by.into_inner();
        let confirmed = payment::Status::Confirmed;

        const SQL: &str = "\
            SELECT c.id, c.period_id, c.unit_id, \
                   c.description, c.amount, c.category, \
                   c.prorated, c.payer_kind, \
                   c.receipt_text, \
                   p.year, p.month, p.due_date, \
                   p.status AS period_status, \
                   COALESCE((SELECT SUM(pm.amount) \
                             FROM payments pm \
                             WHERE pm.charge_id = c.id \
                                   AND pm.status = $3::INT2), 0) AS paid \
            FROM charges c \
            JOIN expense_periods p ON p.id = c.period_id \
            WHERE c.period_id = $1::UUID \
                  AND c.unit_id = $2::UUID \
            ORDER BY c.id";
        Ok(self
            .query(SQL, &[&period_id, &unit_id, &confirmed])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(balance_from_row)
            .collect())
    }
}

/// Reconstructs a [`read::charge::Balance`] from the provided row.
fn balance_from_row(row: &Row) -> read::charge::Balance {
    read::charge::Balance {
        charge: charge_from_row(row),
        year: row.get("year"),
        month: row.get("month"),
        due_date: row.get("due_date"),
        period_status: row.get("period_status"),
        paid: row.get("paid"),
    }
}

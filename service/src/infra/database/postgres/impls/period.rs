//! [`Period`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{building, payment, period, Period},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of a full `expense_periods` row, in [`period_from_row()`] order.
const PERIOD_COLUMNS: &str = "\
    id, building_id, \
    year, month, \
    generated_at, due_date, \
    reserve_amount, total_amount, \
    status";

/// Reconstructs a [`Period`] from the provided [`PERIOD_COLUMNS`] row.
fn period_from_row(row: &Row) -> Period {
    Period {
        id: row.get("id"),
        building_id: row.get("building_id"),
        year: row.get("year"),
        month: row.get("month"),
        generated_at: row.get("generated_at"),
        due_date: row.get("due_date"),
        reserve_amount: row.get("reserve_amount"),
        total_amount: row.get("total_amount"),
        status: row.get("status"),
    }
}

impl<C> Database<Select<By<Option<Period>, period::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Period>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Period>, period::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: period::Id = by.into_inner();

        let sql = format!(
            "SELECT {PERIOD_COLUMNS} \
             FROM expense_periods \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(period_from_row))
    }
}

impl<C> Database<Lock<By<Option<Period>, period::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Period>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Option<Period>, period::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: period::Id = by.into_inner();

        let sql = format!(
            "SELECT {PERIOD_COLUMNS} \
             FROM expense_periods \
             WHERE id = $1::UUID \
             FOR UPDATE",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(period_from_row))
    }
}

impl<C> Database<Insert<Period>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(period): Insert<Period>,
    ) -> Result<Self::Ok, Self::Err> {
        let Period {
            id,
            building_id,
            year,
            month,
            generated_at,
            due_date,
            reserve_amount,
            total_amount,
            status,
        } = period;

        // No upsert here: a conflicting row must surface as a unique
        // violation of `expense_periods_building_cycle_key`.
        const SQL: &str = "\
            INSERT INTO expense_periods (\
                id, building_id, \
                year, month, \
                generated_at, due_date, \
                reserve_amount, total_amount, \
                status\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::INT2, $4::INT2, \
                $5::DATE, $6::DATE, \
                $7::NUMERIC, $8::NUMERIC, \
                $9::INT2\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &building_id,
                &year,
                &month,
                &generated_at,
                &due_date,
                &reserve_amount,
                &total_amount,
                &status,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<period::Totals>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(totals): Update<period::Totals>,
    ) -> Result<Self::Ok, Self::Err> {
        let period::Totals {
            id,
            total_amount,
            reserve_amount,
        } = totals;

        const SQL: &str = "\
            UPDATE expense_periods \
            SET total_amount = $2::NUMERIC, \
                reserve_amount = $3::NUMERIC \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id, &total_amount, &reserve_amount])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<
            By<
                Vec<read::period::Summary>,
                (building::Id, read::period::CycleRange),
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::period::Summary>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                Vec<read::period::Summary>,
                (building::Id, read::period::CycleRange),
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (building_id, range) = by.into_inner();

        const SQL: &str = "\
            SELECT p.id, p.year, p.month, p.due_date, \
                   p.reserve_amount, p.total_amount, p.status, \
                   (SELECT COUNT(*) \
                    FROM charges c \
                    WHERE c.period_id = p.id) AS charges_count, \
                   (SELECT COUNT(*) \
                    FROM period_revisions r \
                    WHERE r.period_id = p.id) AS revisions_count, \
                   (SELECT MAX(r.created_at) \
                    FROM period_revisions r \
                    WHERE r.period_id = p.id) AS last_revision_at \
            FROM expense_periods p \
            WHERE p.building_id = $1::UUID \
                  AND ($2::INT4 IS NULL \
                       OR p.year * 100 + p.month >= $2::INT4) \
                  AND ($3::INT4 IS NULL \
                       OR p.year * 100 + p.month <= $3::INT4) \
            ORDER BY p.year DESC, p.month DESC";
        Ok(self
            .query(SQL, &[&building_id, &range.from, &range.to])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| read::period::Summary {
                id: row.get("id"),
                year: row.get("year"),
                month: row.get("month"),
                due_date: row.get("due_date"),
                reserve_amount: row.get("reserve_amount"),
                total_amount: row.get("total_amount"),
                status: row.get("status"),
                charges_count: row.get("charges_count"),
                revisions_count: row.get("revisions_count"),
                last_revision_at: row.get("last_revision_at"),
            })
            .collect())
    }
}

impl<C>
    Database<
        Select<By<Vec<read::period::UnitSummary>, read::period::UnitCycles>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::period::UnitSummary>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<read::period::UnitSummary>, read::period::UnitCycles>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::period::UnitCycles {
            building_id,
            unit_id,
            range,
        } = by.into_inner();
        let confirmed = payment::Status::Confirmed;

        // Every period of the building is listed, even when the unit has no
        // charges in it.
        const SQL: &str = "\
            SELECT p.id, p.year, p.month, p.due_date, p.status, \
                   COALESCE((SELECT SUM(c.amount) \
                             FROM charges c \
                             WHERE c.period_id = p.id \
                                   AND c.unit_id = $2::UUID), 0) AS total, \
                   COALESCE((SELECT SUM(pm.amount) \
                             FROM payments pm \
                             JOIN charges c ON c.id = pm.charge_id \
                             WHERE c.period_id = p.id \
                                   AND c.unit_id = $2::UUID \
                                   AND pm.status = $5::INT2), 0) AS paid \
            FROM expense_periods p \
            WHERE p.building_id = $1::UUID \
                  AND ($3::INT4 IS NULL \
                       OR p.year * 100 + p.month >= $3::INT4) \
                  AND ($4::INT4 IS NULL \
                       OR p.year * 100 + p.month <= $4::INT4) \
            ORDER BY p.year DESC, p.month DESC";
        Ok(self
            .query(
                SQL,
                &[&building_id, &unit_id, &range.from, &range.to, &confirmed],
            )
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| read::period::UnitSummary {
                id: row.get("id"),
                year: row.get("year"),
                month: row.get("month"),
                due_date: row.get("due_date"),
                status: row.get("status"),
                total: row.get("total"),
                paid: row.get("paid"),
            })
            .collect())
    }
}

//! [`Payment`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{charge, Payment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            unit_id,
            charge_id,
            user_id,
            issued_at,
            amount,
            method,
            reference,
            status,
            receipt_text,
        } = payment;

        const SQL: &str = "\
            INSERT INTO payments (\
                id, unit_id, charge_id, user_id, \
                issued_at, amount, \
                method, reference, status, \
                receipt_text\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::DATE, $6::NUMERIC, \
                $7::VARCHAR, $8::VARCHAR, $9::INT2, \
                $10::VARCHAR\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &unit_id,
                &charge_id,
                &user_id,
                &issued_at,
                &amount,
                &method,
                &reference,
                &status,
                &receipt_text,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Payment>, charge::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, charge::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let charge_id: charge::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, unit_id, charge_id, user_id, \
                   issued_at, amount, \
                   method, reference, status, \
                   receipt_text \
            FROM payments \
            WHERE charge_id = $1::UUID \
            ORDER BY issued_at DESC, id";
        Ok(self
            .query(SQL, &[&charge_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Payment {
                id: row.get("id"),
                unit_id: row.get("unit_id"),
                charge_id: row.get("charge_id"),
                user_id: row.get("user_id"),
                issued_at: row.get("issued_at"),
                amount: row.get("amount"),
                method: row.get("method"),
                reference: row.get("reference"),
                status: row.get("status"),
                receipt_text: row.get("receipt_text"),
            })
            .collect())
    }
}

//! [`Revision`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{period, Revision},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<Revision>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(revision): Insert<Revision>,
    ) -> Result<Self::Ok, Self::Err> {
        let Revision {
            id,
            period_id,
            author_id,
            action,
            note,
            detail,
            created_at,
        } = revision;

        const SQL: &str = "\
            INSERT INTO period_revisions (\
                id, period_id, author_id, \
                action, note, detail, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::INT2, $5::VARCHAR, $6::VARCHAR, \
                $7::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &period_id,
                &author_id,
                &action,
                &note,
                &detail,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Revision>, period::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Revision>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Revision>, period::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let period_id: period::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, period_id, author_id, \
                   action, note, detail, \
                   created_at \
            FROM period_revisions \
            WHERE period_id = $1::UUID \
            ORDER BY created_at DESC, id";
        Ok(self
            .query(SQL, &[&period_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Revision {
                id: row.get("id"),
                period_id: row.get("period_id"),
                author_id: row.get("author_id"),
                action: row.get("action"),
                note: row.get("note"),
                detail: row.get("detail"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

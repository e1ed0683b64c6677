//! Housing-unit-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{building, unit, user},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

impl<C> Database<Select<By<Vec<read::unit::Share>, building::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::unit::Share>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::unit::Share>, building::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let building_id: building::Id = by.into_inner();

        // The `ORDER BY` pins which unit absorbs the proration remainder.
        const SQL: &str = "\
            SELECT hu.id, hu.aliquot, \
                   EXISTS(SELECT 1 \
                          FROM residents r \
                          WHERE r.unit_id = hu.id \
                                AND r.is_active) AS has_active_resident \
            FROM housing_units hu \
            WHERE hu.building_id = $1::UUID \
            ORDER BY hu.id";
        Ok(self
            .query(SQL, &[&building_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| read::unit::Share {
                id: row.get("id"),
                weight: row.get("aliquot"),
                has_active_resident: row.get("has_active_resident"),
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<unit::Id>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<unit::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<unit::Id>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let user_id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT unit_id \
            FROM residents \
            WHERE user_id = $1::UUID \
                  AND is_active \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| row.get("unit_id")))
    }
}

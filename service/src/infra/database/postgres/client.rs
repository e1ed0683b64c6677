//! Postgres database client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Non-transactional Postgres database client.
///
/// Draws a pooled [`connection::NonTx`] per operation and returns it to
/// the pool once the operation completes.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] the connections are drawn from.
    pub(crate) pool: connection::Pool,
}

impl NonTx {
    /// Creates a new [`NonTx`] client on top of the provided
    /// [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self { pool }
    }

    /// Draws a [`Connection`] from the underlying [`connection::Pool`].
    async fn connection(
        &self,
    ) -> Result<connection::NonTx, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Transactional Postgres database client.
///
/// Opened eagerly: the transaction is started the moment the client is
/// created, so every following operation observes its snapshot and row
/// locks.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Transaction shared between clones of this client.
    tx: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Opens a new [`Tx`] client by starting a transaction on a
    /// [`Connection`] drawn from the provided [`connection::Pool`].
    ///
    /// # Errors
    ///
    /// If failed to draw a [`Connection`] or to start a transaction.
    pub(crate) async fn open(
        pool: &connection::Pool,
    ) -> Result<Self, Traced<database::Error>> {
        let conn = pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?;
        let tx = connection::Tx::from_non_tx(conn)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Self {
            tx: Arc::new(RwLock::new(Some(tx))),
        })
    }

    /// Returns the underlying [`Connection`] of this [`Tx`] client.
    async fn connection(&self) -> RwLockReadGuard<'_, connection::Tx> {
        RwLockReadGuard::map(self.tx.read().await, |tx| {
            tx.as_ref().expect("already committed")
        })
    }

    /// Commits this [`Tx`] client.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction of this [`Tx`] client.
    pub(crate) async fn commit(&self) -> Result<(), Traced<database::Error>> {
        if let Some(tx) = self.tx.write().await.take() {
            tx.commit().await.map_err(tracerr::wrap!())
        } else {
            // No transaction to commit, so nothing to do.
            Ok(())
        }
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .query(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}

//! Pool-backed query API and transactions.

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};
use crate::row::{bind_all, first_value, row_to_json};
use crate::statement;
use serde_json::{Map, Value};
use sqlx::MySql;
use sqlx::mysql::{MySqlPool, MySqlQueryResult};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use zocalo_log::{debug, info, warn};

/// Future returned by a [`Db::transaction`] body.
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = T> + Send + 't>>;

/// Run `fut` under `limit`, tagging failures with the statement text.
async fn timed<T, F>(limit: Duration, sql: &str, fut: F) -> DbResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(DbError::Query {
            source,
            query: sql.to_string(),
        }),
        Err(_) => Err(DbError::Timeout {
            query: sql.to_string(),
            limit,
        }),
    }
}

fn affected(result: MySqlQueryResult, return_id: bool) -> u64 {
    if return_id {
        result.last_insert_id()
    } else {
        result.rows_affected()
    }
}

/// Shared handle to a MySQL connection pool.
///
/// Cloning is cheap; every clone uses the same pool.
#[derive(Clone, Debug)]
pub struct Db {
    pool: MySqlPool,
    timeout: Duration,
}

impl Db {
    /// Open the pool and check a connection can be established.
    pub async fn connect(config: &DbConfig) -> DbResult<Self> {
        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await
            .map_err(DbError::Connection)?;

        info!(url = %config.display_url(), "Database pool ready");
        Ok(Self::from_pool(pool, config.timeout))
    }

    /// Build the pool without connecting; connections open on first use.
    pub fn connect_lazy(config: &DbConfig) -> Self {
        let pool = config
            .pool_options()
            .connect_lazy_with(config.connect_options());
        Self::from_pool(pool, config.timeout)
    }

    pub fn from_pool(pool: MySqlPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// All rows of a SELECT as JSON objects.
    pub async fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Map<String, Value>>> {
        debug!(sql, params = ?params, "Executing query");
        let rows = timed(
            self.timeout,
            sql,
            bind_all(sqlx::query(sql), params).fetch_all(&self.pool),
        )
        .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// First row, if any.
    pub async fn query_row(
        &self,
        sql: &str,
        params: &[Value],
    ) -> DbResult<Option<Map<String, Value>>> {
        debug!(sql, params = ?params, "Executing query");
        let row = timed(
            self.timeout,
            sql,
            bind_all(sqlx::query(sql), params).fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.as_ref().map(row_to_json))
    }

    /// First column of the first row, if any.
    pub async fn query_value(&self, sql: &str, params: &[Value]) -> DbResult<Option<Value>> {
        debug!(sql, params = ?params, "Executing query");
        let row = timed(
            self.timeout,
            sql,
            bind_all(sqlx::query(sql), params).fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.as_ref().and_then(first_value))
    }

    /// Run a write statement. Returns the last insert id when `return_id`
    /// is set, the number of affected rows otherwise.
    pub async fn execute(&self, sql: &str, params: &[Value], return_id: bool) -> DbResult<u64> {
        debug!(sql, params = ?params, "Executing statement");
        let result = timed(
            self.timeout,
            sql,
            bind_all(sqlx::query(sql), params).execute(&self.pool),
        )
        .await?;
        Ok(affected(result, return_id))
    }

    /// Insert `data` into `table` and return the new id.
    pub async fn save(&self, table: &str, data: &Map<String, Value>) -> DbResult<u64> {
        let (sql, params) = statement::insert(table, data)?;
        self.execute(&sql, &params, true).await
    }

    /// Update the row whose `id_field` equals `data[id_field]`.
    pub async fn update_item(
        &self,
        table: &str,
        id_field: &str,
        data: &Map<String, Value>,
    ) -> DbResult<u64> {
        match statement::update(table, id_field, data)? {
            Some((sql, params)) => self.execute(&sql, &params, false).await,
            None => Ok(0),
        }
    }

    /// Run `body` inside a transaction.
    ///
    /// Commits when the body returns `Ok`. On `Err` the transaction is
    /// rolled back before the error is returned.
    ///
    /// ```no_run
    /// # use zocalo_database::*;
    /// # use serde_json::{json, Map};
    /// # async fn example(db: Db, venta: Map<String, serde_json::Value>) -> DbResult<u64> {
    /// let id = db
    ///     .transaction(|tx| {
    ///         Box::pin(async move {
    ///             let id = tx.save("ventas", &venta).await?;
    ///             tx.execute("UPDATE clientes SET estado = 'activo' WHERE id_cliente = ?",
    ///                 &[venta["id_cliente"].clone()], false).await?;
    ///             Ok::<_, DbError>(id)
    ///         })
    ///     })
    ///     .await?;
    /// # Ok(id)
    /// # }
    /// ```
    pub async fn transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: for<'t> FnOnce(&'t mut Transaction) -> TxFuture<'t, Result<T, E>>,
        E: From<DbError>,
    {
        let inner = timed(self.timeout, "BEGIN", self.pool.begin()).await?;
        let mut tx = Transaction {
            inner,
            timeout: self.timeout,
        };

        match body(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// An open transaction handed to a [`Db::transaction`] body.
pub struct Transaction {
    inner: sqlx::Transaction<'static, MySql>,
    timeout: Duration,
}

impl Transaction {
    pub async fn query(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> DbResult<Vec<Map<String, Value>>> {
        debug!(sql, params = ?params, "Executing query in transaction");
        let rows = timed(
            self.timeout,
            sql,
            bind_all(sqlx::query(sql), params).fetch_all(&mut *self.inner),
        )
        .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    pub async fn query_row(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> DbResult<Option<Map<String, Value>>> {
        debug!(sql, params = ?params, "Executing query in transaction");
        let row = timed(
            self.timeout,
            sql,
            bind_all(sqlx::query(sql), params).fetch_optional(&mut *self.inner),
        )
        .await?;
        Ok(row.as_ref().map(row_to_json))
    }

    pub async fn query_value(&mut self, sql: &str, params: &[Value]) -> DbResult<Option<Value>> {
        debug!(sql, params = ?params, "Executing query in transaction");
        let row = timed(
            self.timeout,
            sql,
            bind_all(sqlx::query(sql), params).fetch_optional(&mut *self.inner),
        )
        .await?;
        Ok(row.as_ref().and_then(first_value))
    }

    pub async fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
        return_id: bool,
    ) -> DbResult<u64> {
        debug!(sql, params = ?params, "Executing statement in transaction");
        let result = timed(
            self.timeout,
            sql,
            bind_all(sqlx::query(sql), params).execute(&mut *self.inner),
        )
        .await?;
        Ok(affected(result, return_id))
    }

    pub async fn save(&mut self, table: &str, data: &Map<String, Value>) -> DbResult<u64> {
        let (sql, params) = statement::insert(table, data)?;
        self.execute(&sql, &params, true).await
    }

    pub async fn update_item(
        &mut self,
        table: &str,
        id_field: &str,
        data: &Map<String, Value>,
    ) -> DbResult<u64> {
        match statement::update(table, id_field, data)? {
            Some((sql, params)) => self.execute(&sql, &params, false).await,
            None => Ok(0),
        }
    }

    async fn commit(self) -> DbResult<()> {
        timed(self.timeout, "COMMIT", self.inner.commit()).await
    }

    async fn rollback(self) -> DbResult<()> {
        debug!("Rolling back transaction");
        timed(self.timeout, "ROLLBACK", self.inner.rollback()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_db() -> Db {
        let config = DbConfig::new("127.0.0.1", "tienda")
            .with_port(1)
            .with_timeout(Duration::from_millis(200));
        Db::connect_lazy(&config)
    }

    #[tokio::test]
    async fn test_invalid_identifier_fails_before_touching_pool() {
        let db = unreachable_db();
        let data: Map<String, Value> = serde_json::from_str(r#"{"a b": 1}"#).unwrap();

        assert!(matches!(
            db.save("usuarios", &data).await,
            Err(DbError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            db.update_item("usuarios; --", "id", &data).await,
            Err(DbError::MissingField(_))
        ));
    }

    #[tokio::test]
    async fn test_update_with_nothing_to_set_returns_zero() {
        let db = unreachable_db();
        let data: Map<String, Value> = serde_json::from_str(r#"{"id_venta": 3}"#).unwrap();

        assert_eq!(db.update_item("ventas", "id_venta", &data).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_failing_statement() {
        let db = unreachable_db();
        let err = db.query("SELECT 1", &[]).await.unwrap_err();

        assert_eq!(err.query(), Some("SELECT 1"));
    }

    #[tokio::test]
    async fn test_transaction_begin_failure_is_returned() {
        let db = unreachable_db();
        let result: Result<u64, DbError> = db
            .transaction(|tx| Box::pin(async move { tx.execute("SELECT 1", &[], false).await }))
            .await;

        assert_eq!(result.unwrap_err().query(), Some("BEGIN"));
    }
}

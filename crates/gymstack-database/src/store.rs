//! Entity store adapter: scope-aware statement dispatch.
//!
//! [`StoreAdapter`] is the single seam between the repositories and the
//! persistence engine. Every method takes the prepared statement and an
//! optional [`TransactionScope`], and resolves the executor fresh on each
//! call: the ambient pool when the scope is absent, the scope's open
//! transaction when present. Resolution is pure dispatch; nothing is
//! cached between calls, so a handle can never go stale against a closed
//! scope.
//!
//! The adapter also owns the one place sqlx errors become [`AppError`]s,
//! so every repository reports constraint violations, store-side aborts,
//! and timeouts uniformly.

use sqlx::postgres::{PgArguments, PgPool, PgQueryResult, PgRow};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::{FromRow, Postgres};

use gymstack_core::error::{AppError, ErrorKind};
use gymstack_core::result::AppResult;

use crate::scope::TransactionScope;

/// Thin, swappable handle to the underlying persistence engine.
#[derive(Debug, Clone)]
pub struct StoreAdapter {
    pool: PgPool,
}

impl StoreAdapter {
    /// Create a new store adapter over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return the ambient connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch at most one row. Absence is `Ok(None)`.
    pub fn fetch_optional<'a, 'q, O>(
        &'a self,
        context: &'a str,
        query: QueryAs<'q, Postgres, O, PgArguments>,
        scope: Option<&'a TransactionScope>,
    ) -> impl Future<Output = AppResult<Option<O>>> + Send + use<'a, 'q, O>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        async move {
            let result = match scope {
                Some(scope) => {
                    let mut tx = scope.executor().await?;
                    query.fetch_optional(&mut *tx).await
                }
                None => query.fetch_optional(&self.pool).await,
            };
            result.map_err(|e| map_store_error(context, e))
        }
    }

    /// Fetch exactly one row.
    pub fn fetch_one<'a, 'q, O>(
        &'a self,
        context: &'a str,
        query: QueryAs<'q, Postgres, O, PgArguments>,
        scope: Option<&'a TransactionScope>,
    ) -> impl Future<Output = AppResult<O>> + Send + use<'a, 'q, O>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        async move {
            let result = match scope {
                Some(scope) => {
                    let mut tx = scope.executor().await?;
                    query.fetch_one(&mut *tx).await
                }
                None => query.fetch_one(&self.pool).await,
            };
            result.map_err(|e| map_store_error(context, e))
        }
    }

    /// Fetch all matching rows.
    pub fn fetch_all<'a, 'q, O>(
        &'a self,
        context: &'a str,
        query: QueryAs<'q, Postgres, O, PgArguments>,
        scope: Option<&'a TransactionScope>,
    ) -> impl Future<Output = AppResult<Vec<O>>> + Send + use<'a, 'q, O>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        async move {
            let result = match scope {
                Some(scope) => {
                    let mut tx = scope.executor().await?;
                    query.fetch_all(&mut *tx).await
                }
                None => query.fetch_all(&self.pool).await,
            };
            result.map_err(|e| map_store_error(context, e))
        }
    }

    /// Fetch a single scalar value (counts, exists checks, sums).
    pub fn fetch_scalar<'a, 'q, O>(
        &'a self,
        context: &'a str,
        query: QueryScalar<'q, Postgres, O, PgArguments>,
        scope: Option<&'a TransactionScope>,
    ) -> impl Future<Output = AppResult<O>> + Send + use<'a, 'q, O>
    where
        O: Send + Unpin,
        (O,): for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        async move {
            let result = match scope {
                Some(scope) => {
                    let mut tx = scope.executor().await?;
                    query.fetch_one(&mut *tx).await
                }
                None => query.fetch_one(&self.pool).await,
            };
            result.map_err(|e| map_store_error(context, e))
        }
    }

    /// Execute a statement that returns no rows.
    pub fn execute<'a, 'q>(
        &'a self,
        context: &'a str,
        query: Query<'q, Postgres, PgArguments>,
        scope: Option<&'a TransactionScope>,
    ) -> impl Future<Output = AppResult<PgQueryResult>> + Send + use<'a, 'q> {
        async move {
            let result = match scope {
                Some(scope) => {
                    let mut tx = scope.executor().await?;
                    query.execute(&mut *tx).await
                }
                None => query.execute(&self.pool).await,
            };
            result.map_err(|e| map_store_error(context, e))
        }
    }
}

/// Map a sqlx error into the application error taxonomy.
///
/// Unique and referential violations become `Conflict`; serialization
/// failures and deadlocks (SQLSTATE 40001 / 40P01) become
/// `TransactionAborted`, which the caller may retry as a whole unit of
/// work; pool acquire timeouts become `Timeout`.
pub(crate) fn map_store_error(context: &str, err: sqlx::Error) -> AppError {
    let (kind, message) = match &err {
        sqlx::Error::Database(db_err) => {
            if matches!(db_err.code().as_deref(), Some("40001" | "40P01")) {
                (
                    ErrorKind::TransactionAborted,
                    format!("{context}: transaction aborted by the store"),
                )
            } else {
                match db_err.kind() {
                    sqlx::error::ErrorKind::UniqueViolation => (
                        ErrorKind::Conflict,
                        match db_err.constraint() {
                            Some(constraint) => {
                                format!("{context}: unique constraint '{constraint}' violated")
                            }
                            None => format!("{context}: unique constraint violated"),
                        },
                    ),
                    sqlx::error::ErrorKind::ForeignKeyViolation => (
                        ErrorKind::Conflict,
                        match db_err.constraint() {
                            Some(constraint) => {
                                format!("{context}: referential constraint '{constraint}' violated")
                            }
                            None => format!("{context}: referential constraint violated"),
                        },
                    ),
                    _ => (ErrorKind::Database, context.to_string()),
                }
            }
        }
        sqlx::Error::PoolTimedOut => (
            ErrorKind::Timeout,
            format!("{context}: timed out acquiring a database connection"),
        ),
        _ => (ErrorKind::Database, context.to_string()),
    };
    AppError::with_source(kind, message, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_maps_to_timeout() {
        let err = map_store_error("Failed to count users", sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("Failed to count users"));
    }

    #[test]
    fn test_generic_error_maps_to_database() {
        let err = map_store_error("Failed to find user by id", sqlx::Error::RowNotFound);
        assert_eq!(err.kind, ErrorKind::Database);
    }
}

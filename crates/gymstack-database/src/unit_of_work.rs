//! Unit-of-work coordinator: atomic execution of multi-repository writes.
//!
//! A unit of work is a caller-supplied async function executed exactly
//! once against a fresh [`TransactionScope`]. The coordinator begins the
//! transaction, hands the scope to the work function, commits when it
//! returns `Ok`, and rolls back and re-raises when it returns `Err`.
//! Callers therefore always observe either a fully applied result or a
//! propagated error with rollback already complete.
//!
//! Caller obligations the coordinator cannot enforce at runtime:
//!
//! - The work function must not perform operations outside the store
//!   (outbound network calls, file I/O). An open transaction holds locks,
//!   and an unbounded external call holds them for an unbounded time.
//! - A scope must not escape the `execute` call that created it. Late use
//!   fails loudly with `InvalidScopeUse` rather than silently running
//!   outside the transaction.
//!
//! Nested execution *is* enforced: calling `execute` from inside another
//! unit of work on the same task is rejected, since scopes are not
//! reentrant.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, join_all};
use sqlx::PgPool;
use tokio::time;
use tracing::{debug, warn};

use gymstack_core::error::AppError;
use gymstack_core::result::AppResult;

use crate::scope::TransactionScope;
use crate::store::map_store_error;

tokio::task_local! {
    /// Marker set for the duration of a unit of work on the current task.
    static IN_UNIT_OF_WORK: ();
}

/// Transaction isolation level, mirroring the PostgreSQL levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// PostgreSQL treats this as read committed.
    ReadUncommitted,
    /// Statements see only data committed before the statement began.
    #[default]
    ReadCommitted,
    /// The whole transaction sees one snapshot.
    RepeatableRead,
    /// Full serializable execution; may abort with a serialization
    /// failure the caller should retry.
    Serializable,
}

impl IsolationLevel {
    /// The `SET TRANSACTION` statement for this level.
    ///
    /// Must be the first statement executed inside the transaction.
    pub fn set_statement(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "SET TRANSACTION ISOLATION LEVEL READ UNCOMMITTED",
            Self::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            Self::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            Self::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadUncommitted => write!(f, "read uncommitted"),
            Self::ReadCommitted => write!(f, "read committed"),
            Self::RepeatableRead => write!(f, "repeatable read"),
            Self::Serializable => write!(f, "serializable"),
        }
    }
}

/// Options for [`UnitOfWork::execute_with_options`].
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    /// Bound on waiting to acquire a transaction under pool contention.
    /// `None` defers to the pool's own acquire timeout.
    pub max_wait: Option<Duration>,
    /// Bound on the whole unit of work. Expiry forces rollback and
    /// surfaces a `Timeout` error. `None` means no client-side bound.
    pub timeout: Option<Duration>,
    /// Isolation level for the transaction.
    pub isolation: IsolationLevel,
}

impl TxOptions {
    /// Set the scope-acquisition wait bound.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Set the whole-transaction time budget.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the isolation level.
    pub fn isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }
}

/// Coordinator that groups repository operations into one atomic,
/// possibly-isolated transaction.
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    pool: PgPool,
}

impl UnitOfWork {
    /// Create a new coordinator over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Execute a unit of work with default options.
    ///
    /// Opens a scope, invokes `work(scope)`, commits on normal return,
    /// rolls back and re-raises on any error. Returns the value `work`
    /// produced. Every error from `work` triggers rollback; no business
    /// error is "soft" inside a unit of work.
    pub async fn execute<T, F, Fut>(&self, work: F) -> AppResult<T>
    where
        F: FnOnce(Arc<TransactionScope>) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.run(work, TxOptions::default()).await
    }

    /// Execute a unit of work with caller-controlled wait, time budget,
    /// and isolation level.
    pub async fn execute_with_options<T, F, Fut>(
        &self,
        work: F,
        options: TxOptions,
    ) -> AppResult<T>
    where
        F: FnOnce(Arc<TransactionScope>) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.run(work, options).await
    }

    /// Execute a fixed list of independent operations, returning results
    /// in input order.
    ///
    /// This exists purely for round-trip efficiency of operations with no
    /// data dependency on one another. It is **not** atomic: PostgreSQL
    /// cannot batch heterogeneous statements atomically over a pool, so
    /// each operation commits or fails on its own and a failure does not
    /// undo its neighbors. Use [`UnitOfWork::execute`] when cross-operation
    /// rollback is required.
    pub async fn batch<'a, T>(
        &self,
        operations: Vec<BoxFuture<'a, AppResult<T>>>,
    ) -> Vec<AppResult<T>> {
        join_all(operations).await
    }

    async fn run<T, F, Fut>(&self, work: F, options: TxOptions) -> AppResult<T>
    where
        F: FnOnce(Arc<TransactionScope>) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        // Scopes are not reentrant: a unit of work started inside another
        // one on the same task is a contract violation, not a savepoint.
        if IN_UNIT_OF_WORK.try_with(|_| ()).is_ok() {
            return Err(AppError::invalid_scope_use(
                "Nested unit-of-work execution is not supported",
            ));
        }

        debug!(isolation = %options.isolation, "Acquiring transaction scope");
        let begin = self.pool.begin();
        let mut tx = match options.max_wait {
            Some(wait) => time::timeout(wait, begin)
                .await
                .map_err(|_| {
                    AppError::timeout(format!(
                        "Timed out after {}ms waiting to acquire a transaction scope",
                        wait.as_millis()
                    ))
                })?
                .map_err(|e| map_store_error("Failed to begin transaction", e))?,
            None => begin
                .await
                .map_err(|e| map_store_error("Failed to begin transaction", e))?,
        };

        if options.isolation != IsolationLevel::ReadCommitted {
            sqlx::query(options.isolation.set_statement())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_store_error("Failed to set isolation level", e))?;
        }

        let scope = Arc::new(TransactionScope::new(tx));
        debug!("Transaction scope open");

        let outcome = IN_UNIT_OF_WORK
            .scope((), async {
                match options.timeout {
                    Some(limit) => match time::timeout(limit, work(Arc::clone(&scope))).await {
                        Ok(result) => result,
                        Err(_) => Err(AppError::timeout(format!(
                            "Unit of work exceeded its {}ms time budget",
                            limit.as_millis()
                        ))),
                    },
                    None => work(Arc::clone(&scope)).await,
                }
            })
            .await;

        let Some(tx) = scope.take().await else {
            return Err(AppError::invalid_scope_use(
                "Transaction scope was consumed before its owning unit of work completed",
            ));
        };

        match outcome {
            Ok(value) => {
                debug!("Committing transaction");
                tx.commit()
                    .await
                    .map_err(|e| map_store_error("Failed to commit transaction", e))?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Rolling back transaction");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed after unit-of-work error");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_isolation_is_read_committed() {
        assert_eq!(IsolationLevel::default(), IsolationLevel::ReadCommitted);
        assert_eq!(TxOptions::default().isolation, IsolationLevel::ReadCommitted);
    }

    #[test]
    fn test_set_statements() {
        assert_eq!(
            IsolationLevel::Serializable.set_statement(),
            "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE"
        );
        assert_eq!(
            IsolationLevel::RepeatableRead.set_statement(),
            "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ"
        );
    }

    #[test]
    fn test_options_builder() {
        let options = TxOptions::default()
            .max_wait(Duration::from_millis(50))
            .timeout(Duration::from_secs(2))
            .isolation(IsolationLevel::Serializable);
        assert_eq!(options.max_wait, Some(Duration::from_millis(50)));
        assert_eq!(options.timeout, Some(Duration::from_secs(2)));
        assert_eq!(options.isolation, IsolationLevel::Serializable);
    }
}

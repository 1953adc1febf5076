//! Transaction scope: the opaque handle a unit of work threads through
//! repository calls.
//!
//! A [`TransactionScope`] is created only by the unit-of-work coordinator
//! and wraps one open sqlx transaction. Repositories borrow the live
//! transaction through [`TransactionScope::executor`] for the duration of
//! a single statement; the coordinator reclaims it with
//! [`TransactionScope::take`] when the work function returns.
//!
//! Once taken, the scope is permanently closed: any later borrow fails
//! with an `InvalidScopeUse` error instead of silently running the
//! statement outside the transaction. A scope must therefore never be
//! stashed beyond the `execute` call that handed it out.

use sqlx::{PgConnection, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use gymstack_core::error::AppError;
use gymstack_core::result::AppResult;

/// Guard over the live transaction of a scope.
///
/// Dereferences to the transaction's [`PgConnection`]; one statement at
/// a time, statements issued in program order against the same scope
/// execute in that order.
pub type ScopeGuard<'a> = tokio::sync::MappedMutexGuard<'a, PgConnection>;

/// An open, uncommitted unit of atomic work against the store.
pub struct TransactionScope {
    state: Mutex<Option<Transaction<'static, Postgres>>>,
}

impl TransactionScope {
    /// Wrap a freshly begun transaction. Coordinator-only.
    pub(crate) fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            state: Mutex::new(Some(tx)),
        }
    }

    /// Borrow the live transaction for one statement.
    ///
    /// Fails with `InvalidScopeUse` when the owning unit of work has
    /// already committed or rolled back.
    pub(crate) fn executor(&self) -> impl Future<Output = AppResult<ScopeGuard<'_>>> + Send + '_ {
        async move {
            let guard = self.state.lock().await;
            MutexGuard::try_map(guard, |state| state.as_mut().map(|tx| &mut **tx)).map_err(|_| {
                AppError::invalid_scope_use(
                    "Transaction scope used after its owning unit of work completed",
                )
            })
        }
    }

    /// Reclaim the transaction for commit or rollback, closing the scope.
    pub(crate) async fn take(&self) -> Option<Transaction<'static, Postgres>> {
        self.state.lock().await.take()
    }

    /// Whether the scope is still open.
    pub async fn is_open(&self) -> bool {
        self.state.lock().await.is_some()
    }
}

impl std::fmt::Debug for TransactionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope").finish_non_exhaustive()
    }
}

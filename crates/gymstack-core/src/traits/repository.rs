//! Generic repository contract for database access.
//!
//! Every concrete repository is bound to exactly one entity kind and is a
//! stateless singleton: it owns no data, only behavior, and is safely
//! shared across concurrently executing units of work.
//!
//! The `Scope` associated type is the transaction handle of the backing
//! store. Every operation takes `scope: Option<&Self::Scope>` as its last
//! parameter: `Some(scope)` executes the statement inside that open
//! transaction, `None` executes it standalone on the ambient connection.
//! The scope argument is deliberately explicit rather than an overload so
//! that "am I inside a transaction" is visible at every call site.
//! Repositories never begin, commit, or roll back a transaction
//! themselves; atomicity decisions belong entirely to the caller.

use async_trait::async_trait;
use serde::Serialize;

use crate::result::AppResult;
use crate::types::pagination::{PageRequest, PageResponse};

/// Generic CRUD repository contract.
///
/// Entity-specific query methods (lookup by unique secondary key, radius
/// search, token validity checks, ...) are defined on the concrete
/// repository structs and must thread the scope parameter identically to
/// these baseline operations.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// The persisted record type.
    type Entity: Serialize + Send + Sync;
    /// The unique, immutable identifier of the entity kind.
    type Id: Send + Sync;
    /// Attributes required to create a record.
    type Create: Send + Sync;
    /// Partial attributes for updating a record.
    type Update: Send + Sync;
    /// Query filter for list/count/exists operations.
    type Filter: Send + Sync;
    /// The transaction handle of the backing store.
    type Scope: Send + Sync;

    /// Find a record by its primary key. Absence is not an error.
    async fn find_by_id(
        &self,
        id: &Self::Id,
        scope: Option<&Self::Scope>,
    ) -> AppResult<Option<Self::Entity>>;

    /// Find records matching a filter, with pagination.
    async fn find_many(
        &self,
        filter: &Self::Filter,
        page: &PageRequest,
        scope: Option<&Self::Scope>,
    ) -> AppResult<PageResponse<Self::Entity>>;

    /// Create a new record and return it.
    ///
    /// Fails with a conflict error when a uniqueness constraint breaks.
    async fn create(
        &self,
        data: &Self::Create,
        scope: Option<&Self::Scope>,
    ) -> AppResult<Self::Entity>;

    /// Apply a partial update and return the updated record.
    ///
    /// Fails with a not-found error when the id is absent.
    async fn update(
        &self,
        id: &Self::Id,
        data: &Self::Update,
        scope: Option<&Self::Scope>,
    ) -> AppResult<Self::Entity>;

    /// Permanently delete a record and return it.
    ///
    /// Fails with a not-found error when the id is absent.
    async fn delete(&self, id: &Self::Id, scope: Option<&Self::Scope>)
    -> AppResult<Self::Entity>;

    /// Mark a record as deleted by setting its deletion timestamp, and
    /// return the marked record.
    ///
    /// Fails with a not-found error when the id is absent or the record
    /// is already soft-deleted.
    async fn soft_delete(
        &self,
        id: &Self::Id,
        scope: Option<&Self::Scope>,
    ) -> AppResult<Self::Entity>;

    /// Count records matching a filter.
    async fn count(&self, filter: &Self::Filter, scope: Option<&Self::Scope>) -> AppResult<u64>;

    /// Check whether at least one record matches a filter.
    async fn exists(&self, filter: &Self::Filter, scope: Option<&Self::Scope>) -> AppResult<bool>;
}

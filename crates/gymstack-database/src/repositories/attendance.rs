//! Attendance repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gymstack_core::error::{AppError, ErrorKind};
use gymstack_core::result::AppResult;
use gymstack_core::traits::Repository;
use gymstack_core::types::pagination::{PageRequest, PageResponse};
use gymstack_entity::attendance::{Attendance, AttendanceFilter, CheckIn, UpdateAttendance};

use crate::scope::TransactionScope;
use crate::store::StoreAdapter;

fn open_visit_conflict(user_id: &Uuid) -> AppError {
    AppError::conflict(format!("User {user_id} already has an open visit"))
}

/// Repository for attendance records and visit queries.
#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    store: StoreAdapter,
}

impl AttendanceRepository {
    /// Create a new attendance repository.
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// Open a new visit for a member.
    ///
    /// Fails with `Conflict` when the member already has an open visit;
    /// a member can be checked in at most once at a time. The pre-check
    /// gives the common case a cheap answer, but the invariant itself is
    /// held by a partial unique index on open visits, so a concurrent
    /// double check-in loses the race at insert rather than slipping
    /// through.
    pub async fn check_in(
        &self,
        data: &CheckIn,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Attendance> {
        if self.find_open_for_user(&data.user_id, scope).await?.is_some() {
            return Err(open_visit_conflict(&data.user_id));
        }
        self.create(data, scope).await
    }

    /// Close an open visit, stamping the check-out time.
    ///
    /// Fails with `NotFound` when the record does not exist or the visit
    /// is already closed.
    pub async fn check_out(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Attendance> {
        self.store
            .fetch_optional(
                "Failed to check out",
                sqlx::query_as::<_, Attendance>(
                    "UPDATE attendance SET checked_out_at = NOW(), updated_at = NOW() \
                     WHERE id = $1 AND checked_out_at IS NULL AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Open attendance {id} not found")))
    }

    /// Find the member's most recent open visit, if any.
    pub async fn find_open_for_user(
        &self,
        user_id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Option<Attendance>> {
        self.store
            .fetch_optional(
                "Failed to find open attendance for user",
                sqlx::query_as::<_, Attendance>(
                    "SELECT * FROM attendance \
                     WHERE user_id = $1 AND checked_out_at IS NULL AND deleted_at IS NULL \
                     ORDER BY checked_in_at DESC LIMIT 1",
                )
                .bind(*user_id),
                scope,
            )
            .await
    }

    /// List a member's visits inside a time window, newest first.
    pub async fn find_for_user_between(
        &self,
        user_id: &Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Vec<Attendance>> {
        self.store
            .fetch_all(
                "Failed to list attendance for user",
                sqlx::query_as::<_, Attendance>(
                    "SELECT * FROM attendance \
                     WHERE user_id = $1 AND checked_in_at >= $2 AND checked_in_at < $3 \
                       AND deleted_at IS NULL \
                     ORDER BY checked_in_at DESC",
                )
                .bind(*user_id)
                .bind(from)
                .bind(to),
                scope,
            )
            .await
    }

    /// Count visits at an academy inside a time window.
    pub async fn count_for_academy_between(
        &self,
        academy_id: &Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        scope: Option<&TransactionScope>,
    ) -> AppResult<u64> {
        let count: i64 = self
            .store
            .fetch_scalar(
                "Failed to count attendance for academy",
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM attendance \
                     WHERE academy_id = $1 AND checked_in_at >= $2 AND checked_in_at < $3 \
                       AND deleted_at IS NULL",
                )
                .bind(*academy_id)
                .bind(from)
                .bind(to),
                scope,
            )
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl Repository for AttendanceRepository {
    type Entity = Attendance;
    type Id = Uuid;
    type Create = CheckIn;
    type Update = UpdateAttendance;
    type Filter = AttendanceFilter;
    type Scope = TransactionScope;

    async fn find_by_id(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Option<Attendance>> {
        self.store
            .fetch_optional(
                "Failed to find attendance by id",
                sqlx::query_as::<_, Attendance>(
                    "SELECT * FROM attendance WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(*id),
                scope,
            )
            .await
    }

    async fn find_many(
        &self,
        filter: &AttendanceFilter,
        page: &PageRequest,
        scope: Option<&TransactionScope>,
    ) -> AppResult<PageResponse<Attendance>> {
        let total = self.count(filter, scope).await?;

        let records = self
            .store
            .fetch_all(
                "Failed to list attendance",
                sqlx::query_as::<_, Attendance>(
                    "SELECT * FROM attendance \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR user_id = $2) \
                       AND ($3::uuid IS NULL OR academy_id = $3) \
                       AND (NOT $4 OR checked_out_at IS NULL) \
                     ORDER BY checked_in_at DESC LIMIT $5 OFFSET $6",
                )
                .bind(filter.include_deleted)
                .bind(filter.user_id)
                .bind(filter.academy_id)
                .bind(filter.open_only)
                .bind(page.limit() as i64)
                .bind(page.offset() as i64),
                scope,
            )
            .await?;

        Ok(PageResponse::new(records, page, total))
    }

    async fn create(&self, data: &CheckIn, scope: Option<&TransactionScope>) -> AppResult<Attendance> {
        self.store
            .fetch_one(
                "Failed to record check-in",
                sqlx::query_as::<_, Attendance>(
                    "INSERT INTO attendance (user_id, academy_id, checked_in_at) \
                     VALUES ($1, $2, COALESCE($3, NOW())) \
                     RETURNING *",
                )
                .bind(data.user_id)
                .bind(data.academy_id)
                .bind(data.checked_in_at),
                scope,
            )
            .await
            .map_err(|e| {
                if e.kind == ErrorKind::Conflict && e.message.contains("attendance_open_visit_key")
                {
                    open_visit_conflict(&data.user_id)
                } else {
                    e
                }
            })
    }

    async fn update(
        &self,
        id: &Uuid,
        data: &UpdateAttendance,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Attendance> {
        self.store
            .fetch_optional(
                "Failed to update attendance",
                sqlx::query_as::<_, Attendance>(
                    "UPDATE attendance SET checked_out_at = COALESCE($2, checked_out_at), \
                                           updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id)
                .bind(data.checked_out_at),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Attendance {id} not found")))
    }

    async fn delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<Attendance> {
        self.store
            .fetch_optional(
                "Failed to delete attendance",
                sqlx::query_as::<_, Attendance>("DELETE FROM attendance WHERE id = $1 RETURNING *")
                    .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Attendance {id} not found")))
    }

    async fn soft_delete(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Attendance> {
        self.store
            .fetch_optional(
                "Failed to soft-delete attendance",
                sqlx::query_as::<_, Attendance>(
                    "UPDATE attendance SET deleted_at = NOW(), updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Attendance {id} not found")))
    }

    async fn count(
        &self,
        filter: &AttendanceFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<u64> {
        let count: i64 = self
            .store
            .fetch_scalar(
                "Failed to count attendance",
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM attendance \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR user_id = $2) \
                       AND ($3::uuid IS NULL OR academy_id = $3) \
                       AND (NOT $4 OR checked_out_at IS NULL)",
                )
                .bind(filter.include_deleted)
                .bind(filter.user_id)
                .bind(filter.academy_id)
                .bind(filter.open_only),
                scope,
            )
            .await?;
        Ok(count as u64)
    }

    async fn exists(
        &self,
        filter: &AttendanceFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<bool> {
        self.store
            .fetch_scalar(
                "Failed to check attendance existence",
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM attendance \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR user_id = $2) \
                       AND ($3::uuid IS NULL OR academy_id = $3) \
                       AND (NOT $4 OR checked_out_at IS NULL))",
                )
                .bind(filter.include_deleted)
                .bind(filter.user_id)
                .bind(filter.academy_id)
                .bind(filter.open_only),
                scope,
            )
            .await
    }
}

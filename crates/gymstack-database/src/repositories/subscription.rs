//! Subscription repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gymstack_core::error::{AppError, ErrorKind};
use gymstack_core::result::AppResult;
use gymstack_core::traits::Repository;
use gymstack_core::types::pagination::{PageRequest, PageResponse};
use gymstack_entity::subscription::{
    CreateSubscription, Subscription, SubscriptionFilter, UpdateSubscription,
};

use crate::scope::TransactionScope;
use crate::store::StoreAdapter;

/// Repository for subscription CRUD and lifecycle queries.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    store: StoreAdapter,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// List a member's currently active subscriptions.
    pub async fn find_active_for_user(
        &self,
        user_id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Vec<Subscription>> {
        self.store
            .fetch_all(
                "Failed to list active subscriptions for user",
                sqlx::query_as::<_, Subscription>(
                    "SELECT * FROM subscriptions \
                     WHERE user_id = $1 AND status = 'active' AND deleted_at IS NULL \
                     ORDER BY starts_at DESC",
                )
                .bind(*user_id),
                scope,
            )
            .await
    }

    /// List a member's subscription history across all statuses, newest
    /// first.
    pub async fn find_by_user(
        &self,
        user_id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Vec<Subscription>> {
        self.store
            .fetch_all(
                "Failed to list subscriptions for user",
                sqlx::query_as::<_, Subscription>(
                    "SELECT * FROM subscriptions \
                     WHERE user_id = $1 AND deleted_at IS NULL \
                     ORDER BY starts_at DESC",
                )
                .bind(*user_id),
                scope,
            )
            .await
    }

    /// Flip every active subscription whose access window has ended to
    /// `expired`. Returns the number of subscriptions flipped.
    pub async fn expire_due(
        &self,
        now: DateTime<Utc>,
        scope: Option<&TransactionScope>,
    ) -> AppResult<u64> {
        let result = self
            .store
            .execute(
                "Failed to expire due subscriptions",
                sqlx::query(
                    "UPDATE subscriptions SET status = 'expired', updated_at = NOW() \
                     WHERE status = 'active' AND ends_at < $1 AND deleted_at IS NULL",
                )
                .bind(now),
                scope,
            )
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository for SubscriptionRepository {
    type Entity = Subscription;
    type Id = Uuid;
    type Create = CreateSubscription;
    type Update = UpdateSubscription;
    type Filter = SubscriptionFilter;
    type Scope = TransactionScope;

    async fn find_by_id(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Option<Subscription>> {
        self.store
            .fetch_optional(
                "Failed to find subscription by id",
                sqlx::query_as::<_, Subscription>(
                    "SELECT * FROM subscriptions WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(*id),
                scope,
            )
            .await
    }

    async fn find_many(
        &self,
        filter: &SubscriptionFilter,
        page: &PageRequest,
        scope: Option<&TransactionScope>,
    ) -> AppResult<PageResponse<Subscription>> {
        let total = self.count(filter, scope).await?;

        let subscriptions = self
            .store
            .fetch_all(
                "Failed to list subscriptions",
                sqlx::query_as::<_, Subscription>(
                    "SELECT * FROM subscriptions \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR user_id = $2) \
                       AND ($3::uuid IS NULL OR plan_id = $3) \
                       AND ($4::subscription_status IS NULL OR status = $4) \
                     ORDER BY starts_at DESC LIMIT $5 OFFSET $6",
                )
                .bind(filter.include_deleted)
                .bind(filter.user_id)
                .bind(filter.plan_id)
                .bind(filter.status)
                .bind(page.limit() as i64)
                .bind(page.offset() as i64),
                scope,
            )
            .await?;

        Ok(PageResponse::new(subscriptions, page, total))
    }

    async fn create(
        &self,
        data: &CreateSubscription,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Subscription> {
        self.store
            .fetch_one(
                "Failed to create subscription",
                sqlx::query_as::<_, Subscription>(
                    "INSERT INTO subscriptions (user_id, plan_id, starts_at, ends_at) \
                     VALUES ($1, $2, $3, $4) \
                     RETURNING *",
                )
                .bind(data.user_id)
                .bind(data.plan_id)
                .bind(data.starts_at)
                .bind(data.ends_at),
                scope,
            )
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => AppError::conflict(
                    "User already has an active subscription to this plan".to_string(),
                ),
                _ => e,
            })
    }

    async fn update(
        &self,
        id: &Uuid,
        data: &UpdateSubscription,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Subscription> {
        self.store
            .fetch_optional(
                "Failed to update subscription",
                sqlx::query_as::<_, Subscription>(
                    "UPDATE subscriptions SET status = COALESCE($2, status), \
                                              ends_at = COALESCE($3, ends_at), \
                                              cancelled_at = COALESCE($4, cancelled_at), \
                                              updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id)
                .bind(data.status)
                .bind(data.ends_at)
                .bind(data.cancelled_at),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Subscription {id} not found")))
    }

    async fn delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<Subscription> {
        self.store
            .fetch_optional(
                "Failed to delete subscription",
                sqlx::query_as::<_, Subscription>(
                    "DELETE FROM subscriptions WHERE id = $1 RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Subscription {id} not found")))
    }

    async fn soft_delete(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Subscription> {
        self.store
            .fetch_optional(
                "Failed to soft-delete subscription",
                sqlx::query_as::<_, Subscription>(
                    "UPDATE subscriptions SET deleted_at = NOW(), updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Subscription {id} not found")))
    }

    async fn count(
        &self,
        filter: &SubscriptionFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<u64> {
        let count: i64 = self
            .store
            .fetch_scalar(
                "Failed to count subscriptions",
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM subscriptions \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR user_id = $2) \
                       AND ($3::uuid IS NULL OR plan_id = $3) \
                       AND ($4::subscription_status IS NULL OR status = $4)",
                )
                .bind(filter.include_deleted)
                .bind(filter.user_id)
                .bind(filter.plan_id)
                .bind(filter.status),
                scope,
            )
            .await?;
        Ok(count as u64)
    }

    async fn exists(
        &self,
        filter: &SubscriptionFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<bool> {
        self.store
            .fetch_scalar(
                "Failed to check subscription existence",
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM subscriptions \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR user_id = $2) \
                       AND ($3::uuid IS NULL OR plan_id = $3) \
                       AND ($4::subscription_status IS NULL OR status = $4))",
                )
                .bind(filter.include_deleted)
                .bind(filter.user_id)
                .bind(filter.plan_id)
                .bind(filter.status),
                scope,
            )
            .await
    }
}

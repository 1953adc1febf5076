//! Membership plan repository implementation.

use async_trait::async_trait;
use uuid::Uuid;

use gymstack_core::error::{AppError, ErrorKind};
use gymstack_core::result::AppResult;
use gymstack_core::traits::Repository;
use gymstack_core::types::pagination::{PageRequest, PageResponse};
use gymstack_entity::plan::{CreatePlan, Plan, PlanFilter, UpdatePlan};

use crate::scope::TransactionScope;
use crate::store::StoreAdapter;

/// Repository for membership plan CRUD and catalog queries.
#[derive(Debug, Clone)]
pub struct PlanRepository {
    store: StoreAdapter,
}

impl PlanRepository {
    /// Create a new plan repository.
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// List all plans of an academy, cheapest first.
    pub async fn find_by_academy(
        &self,
        academy_id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Vec<Plan>> {
        self.store
            .fetch_all(
                "Failed to list plans by academy",
                sqlx::query_as::<_, Plan>(
                    "SELECT * FROM plans \
                     WHERE academy_id = $1 AND deleted_at IS NULL ORDER BY price_cents ASC",
                )
                .bind(*academy_id),
                scope,
            )
            .await
    }

    /// List the plans of an academy that are open for subscription.
    pub async fn find_active_by_academy(
        &self,
        academy_id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Vec<Plan>> {
        self.store
            .fetch_all(
                "Failed to list active plans by academy",
                sqlx::query_as::<_, Plan>(
                    "SELECT * FROM plans \
                     WHERE academy_id = $1 AND active AND deleted_at IS NULL \
                     ORDER BY price_cents ASC",
                )
                .bind(*academy_id),
                scope,
            )
            .await
    }
}

#[async_trait]
impl Repository for PlanRepository {
    type Entity = Plan;
    type Id = Uuid;
    type Create = CreatePlan;
    type Update = UpdatePlan;
    type Filter = PlanFilter;
    type Scope = TransactionScope;

    async fn find_by_id(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Option<Plan>> {
        self.store
            .fetch_optional(
                "Failed to find plan by id",
                sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1 AND deleted_at IS NULL")
                    .bind(*id),
                scope,
            )
            .await
    }

    async fn find_many(
        &self,
        filter: &PlanFilter,
        page: &PageRequest,
        scope: Option<&TransactionScope>,
    ) -> AppResult<PageResponse<Plan>> {
        let total = self.count(filter, scope).await?;

        let plans = self
            .store
            .fetch_all(
                "Failed to list plans",
                sqlx::query_as::<_, Plan>(
                    "SELECT * FROM plans \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR academy_id = $2) \
                       AND ($3::bool IS NULL OR active = $3) \
                     ORDER BY created_at DESC LIMIT $4 OFFSET $5",
                )
                .bind(filter.include_deleted)
                .bind(filter.academy_id)
                .bind(filter.active)
                .bind(page.limit() as i64)
                .bind(page.offset() as i64),
                scope,
            )
            .await?;

        Ok(PageResponse::new(plans, page, total))
    }

    async fn create(&self, data: &CreatePlan, scope: Option<&TransactionScope>) -> AppResult<Plan> {
        self.store
            .fetch_one(
                "Failed to create plan",
                sqlx::query_as::<_, Plan>(
                    "INSERT INTO plans \
                       (academy_id, name, description, price_cents, currency, duration_days) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     RETURNING *",
                )
                .bind(data.academy_id)
                .bind(&data.name)
                .bind(&data.description)
                .bind(data.price_cents)
                .bind(&data.currency)
                .bind(data.duration_days),
                scope,
            )
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => AppError::conflict(format!(
                    "Plan '{}' already exists in this academy",
                    data.name
                )),
                _ => e,
            })
    }

    async fn update(
        &self,
        id: &Uuid,
        data: &UpdatePlan,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Plan> {
        self.store
            .fetch_optional(
                "Failed to update plan",
                sqlx::query_as::<_, Plan>(
                    "UPDATE plans SET name = COALESCE($2, name), \
                                      description = COALESCE($3, description), \
                                      price_cents = COALESCE($4, price_cents), \
                                      duration_days = COALESCE($5, duration_days), \
                                      active = COALESCE($6, active), \
                                      updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id)
                .bind(&data.name)
                .bind(&data.description)
                .bind(data.price_cents)
                .bind(data.duration_days)
                .bind(data.active),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Plan {id} not found")))
    }

    async fn delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<Plan> {
        self.store
            .fetch_optional(
                "Failed to delete plan",
                sqlx::query_as::<_, Plan>("DELETE FROM plans WHERE id = $1 RETURNING *").bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Plan {id} not found")))
    }

    async fn soft_delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<Plan> {
        self.store
            .fetch_optional(
                "Failed to soft-delete plan",
                sqlx::query_as::<_, Plan>(
                    "UPDATE plans SET deleted_at = NOW(), updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Plan {id} not found")))
    }

    async fn count(&self, filter: &PlanFilter, scope: Option<&TransactionScope>) -> AppResult<u64> {
        let count: i64 = self
            .store
            .fetch_scalar(
                "Failed to count plans",
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM plans \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR academy_id = $2) \
                       AND ($3::bool IS NULL OR active = $3)",
                )
                .bind(filter.include_deleted)
                .bind(filter.academy_id)
                .bind(filter.active),
                scope,
            )
            .await?;
        Ok(count as u64)
    }

    async fn exists(
        &self,
        filter: &PlanFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<bool> {
        self.store
            .fetch_scalar(
                "Failed to check plan existence",
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM plans \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR academy_id = $2) \
                       AND ($3::bool IS NULL OR active = $3))",
                )
                .bind(filter.include_deleted)
                .bind(filter.academy_id)
                .bind(filter.active),
                scope,
            )
            .await
    }
}

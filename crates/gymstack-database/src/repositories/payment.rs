//! Payment repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gymstack_core::error::{AppError, ErrorKind};
use gymstack_core::result::AppResult;
use gymstack_core::traits::Repository;
use gymstack_core::types::pagination::{PageRequest, PageResponse};
use gymstack_entity::payment::{CreatePayment, Payment, PaymentFilter, UpdatePayment};

use crate::scope::TransactionScope;
use crate::store::StoreAdapter;

/// Repository for payment CRUD and settlement queries.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    store: StoreAdapter,
}

impl PaymentRepository {
    /// Create a new payment repository.
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// List all payments of a subscription, newest first.
    pub async fn find_by_subscription(
        &self,
        subscription_id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Vec<Payment>> {
        self.store
            .fetch_all(
                "Failed to list payments by subscription",
                sqlx::query_as::<_, Payment>(
                    "SELECT * FROM payments \
                     WHERE subscription_id = $1 AND deleted_at IS NULL \
                     ORDER BY created_at DESC",
                )
                .bind(*subscription_id),
                scope,
            )
            .await
    }

    /// Settle a pending payment.
    ///
    /// Fails with `NotFound` when the payment does not exist or is not in
    /// the pending state.
    pub async fn mark_paid(
        &self,
        id: &Uuid,
        paid_at: DateTime<Utc>,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Payment> {
        self.store
            .fetch_optional(
                "Failed to mark payment as paid",
                sqlx::query_as::<_, Payment>(
                    "UPDATE payments SET status = 'paid', paid_at = $2, updated_at = NOW() \
                     WHERE id = $1 AND status = 'pending' AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id)
                .bind(paid_at),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Pending payment {id} not found")))
    }

    /// Total amount settled for a subscription, in minor currency units.
    pub async fn total_paid_for_subscription(
        &self,
        subscription_id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<i64> {
        self.store
            .fetch_scalar(
                "Failed to sum paid amounts",
                sqlx::query_scalar(
                    "SELECT COALESCE(SUM(amount_cents), 0)::bigint FROM payments \
                     WHERE subscription_id = $1 AND status = 'paid' AND deleted_at IS NULL",
                )
                .bind(*subscription_id),
                scope,
            )
            .await
    }
}

#[async_trait]
impl Repository for PaymentRepository {
    type Entity = Payment;
    type Id = Uuid;
    type Create = CreatePayment;
    type Update = UpdatePayment;
    type Filter = PaymentFilter;
    type Scope = TransactionScope;

    async fn find_by_id(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Option<Payment>> {
        self.store
            .fetch_optional(
                "Failed to find payment by id",
                sqlx::query_as::<_, Payment>(
                    "SELECT * FROM payments WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(*id),
                scope,
            )
            .await
    }

    async fn find_many(
        &self,
        filter: &PaymentFilter,
        page: &PageRequest,
        scope: Option<&TransactionScope>,
    ) -> AppResult<PageResponse<Payment>> {
        let total = self.count(filter, scope).await?;

        let payments = self
            .store
            .fetch_all(
                "Failed to list payments",
                sqlx::query_as::<_, Payment>(
                    "SELECT * FROM payments \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR subscription_id = $2) \
                       AND ($3::payment_status IS NULL OR status = $3) \
                     ORDER BY created_at DESC LIMIT $4 OFFSET $5",
                )
                .bind(filter.include_deleted)
                .bind(filter.subscription_id)
                .bind(filter.status)
                .bind(page.limit() as i64)
                .bind(page.offset() as i64),
                scope,
            )
            .await?;

        Ok(PageResponse::new(payments, page, total))
    }

    async fn create(
        &self,
        data: &CreatePayment,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Payment> {
        self.store
            .fetch_one(
                "Failed to register payment",
                sqlx::query_as::<_, Payment>(
                    "INSERT INTO payments \
                       (subscription_id, amount_cents, currency, method, reference) \
                     VALUES ($1, $2, $3, $4, $5) \
                     RETURNING *",
                )
                .bind(data.subscription_id)
                .bind(data.amount_cents)
                .bind(&data.currency)
                .bind(data.method)
                .bind(&data.reference),
                scope,
            )
            .await
            .map_err(|e| match (&data.reference, e.kind) {
                (Some(reference), ErrorKind::Conflict) => AppError::conflict(format!(
                    "Payment reference '{reference}' already registered"
                )),
                _ => e,
            })
    }

    async fn update(
        &self,
        id: &Uuid,
        data: &UpdatePayment,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Payment> {
        self.store
            .fetch_optional(
                "Failed to update payment",
                sqlx::query_as::<_, Payment>(
                    "UPDATE payments SET status = COALESCE($2, status), \
                                         paid_at = COALESCE($3, paid_at), \
                                         updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id)
                .bind(data.status)
                .bind(data.paid_at),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment {id} not found")))
    }

    async fn delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<Payment> {
        self.store
            .fetch_optional(
                "Failed to delete payment",
                sqlx::query_as::<_, Payment>("DELETE FROM payments WHERE id = $1 RETURNING *")
                    .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment {id} not found")))
    }

    async fn soft_delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<Payment> {
        self.store
            .fetch_optional(
                "Failed to soft-delete payment",
                sqlx::query_as::<_, Payment>(
                    "UPDATE payments SET deleted_at = NOW(), updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment {id} not found")))
    }

    async fn count(
        &self,
        filter: &PaymentFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<u64> {
        let count: i64 = self
            .store
            .fetch_scalar(
                "Failed to count payments",
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM payments \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR subscription_id = $2) \
                       AND ($3::payment_status IS NULL OR status = $3)",
                )
                .bind(filter.include_deleted)
                .bind(filter.subscription_id)
                .bind(filter.status),
                scope,
            )
            .await?;
        Ok(count as u64)
    }

    async fn exists(
        &self,
        filter: &PaymentFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<bool> {
        self.store
            .fetch_scalar(
                "Failed to check payment existence",
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM payments \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR subscription_id = $2) \
                       AND ($3::payment_status IS NULL OR status = $3))",
                )
                .bind(filter.include_deleted)
                .bind(filter.subscription_id)
                .bind(filter.status),
                scope,
            )
            .await
    }
}

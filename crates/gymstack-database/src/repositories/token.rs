//! Refresh token repository implementation.

use async_trait::async_trait;
use uuid::Uuid;

use gymstack_core::error::AppError;
use gymstack_core::result::AppResult;
use gymstack_core::traits::Repository;
use gymstack_core::types::pagination::{PageRequest, PageResponse};
use gymstack_entity::token::{
    CreateRefreshToken, RefreshToken, RefreshTokenFilter, UpdateRefreshToken,
};

use crate::scope::TransactionScope;
use crate::store::StoreAdapter;

/// Repository for refresh token storage and validity queries.
#[derive(Debug, Clone)]
pub struct RefreshTokenRepository {
    store: StoreAdapter,
}

impl RefreshTokenRepository {
    /// Create a new refresh token repository.
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// Find a token by its hash, only if it is currently valid: not
    /// expired, not revoked, not soft-deleted. Absence is not an error.
    pub async fn find_valid(
        &self,
        token_hash: &str,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Option<RefreshToken>> {
        self.store
            .fetch_optional(
                "Failed to find valid refresh token",
                sqlx::query_as::<_, RefreshToken>(
                    "SELECT * FROM refresh_tokens \
                     WHERE token_hash = $1 AND revoked_at IS NULL \
                       AND deleted_at IS NULL AND expires_at > NOW()",
                )
                .bind(token_hash),
                scope,
            )
            .await
    }

    /// Revoke a single token.
    pub async fn revoke(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<RefreshToken> {
        self.store
            .fetch_optional(
                "Failed to revoke refresh token",
                sqlx::query_as::<_, RefreshToken>(
                    "UPDATE refresh_tokens SET revoked_at = NOW(), updated_at = NOW() \
                     WHERE id = $1 AND revoked_at IS NULL AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Refresh token {id} not found")))
    }

    /// Revoke every live token of a user (logout-everywhere). Returns the
    /// number of tokens revoked.
    pub async fn revoke_all_for_user(
        &self,
        user_id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<u64> {
        let result = self
            .store
            .execute(
                "Failed to revoke user's refresh tokens",
                sqlx::query(
                    "UPDATE refresh_tokens SET revoked_at = NOW(), updated_at = NOW() \
                     WHERE user_id = $1 AND revoked_at IS NULL AND deleted_at IS NULL",
                )
                .bind(*user_id),
                scope,
            )
            .await?;
        Ok(result.rows_affected())
    }

    /// Hard-delete expired tokens. Returns the number of rows removed.
    pub async fn purge_expired(&self, scope: Option<&TransactionScope>) -> AppResult<u64> {
        let result = self
            .store
            .execute(
                "Failed to purge expired refresh tokens",
                sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()"),
                scope,
            )
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Repository for RefreshTokenRepository {
    type Entity = RefreshToken;
    type Id = Uuid;
    type Create = CreateRefreshToken;
    type Update = UpdateRefreshToken;
    type Filter = RefreshTokenFilter;
    type Scope = TransactionScope;

    async fn find_by_id(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Option<RefreshToken>> {
        self.store
            .fetch_optional(
                "Failed to find refresh token by id",
                sqlx::query_as::<_, RefreshToken>(
                    "SELECT * FROM refresh_tokens WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(*id),
                scope,
            )
            .await
    }

    async fn find_many(
        &self,
        filter: &RefreshTokenFilter,
        page: &PageRequest,
        scope: Option<&TransactionScope>,
    ) -> AppResult<PageResponse<RefreshToken>> {
        let total = self.count(filter, scope).await?;

        let tokens = self
            .store
            .fetch_all(
                "Failed to list refresh tokens",
                sqlx::query_as::<_, RefreshToken>(
                    "SELECT * FROM refresh_tokens \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR user_id = $2) \
                       AND (NOT $3 OR (revoked_at IS NULL AND expires_at > NOW())) \
                     ORDER BY created_at DESC LIMIT $4 OFFSET $5",
                )
                .bind(filter.include_deleted)
                .bind(filter.user_id)
                .bind(filter.valid_only)
                .bind(page.limit() as i64)
                .bind(page.offset() as i64),
                scope,
            )
            .await?;

        Ok(PageResponse::new(tokens, page, total))
    }

    async fn create(
        &self,
        data: &CreateRefreshToken,
        scope: Option<&TransactionScope>,
    ) -> AppResult<RefreshToken> {
        self.store
            .fetch_one(
                "Failed to store refresh token",
                sqlx::query_as::<_, RefreshToken>(
                    "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) \
                     VALUES ($1, $2, $3) \
                     RETURNING *",
                )
                .bind(data.user_id)
                .bind(&data.token_hash)
                .bind(data.expires_at),
                scope,
            )
            .await
    }

    async fn update(
        &self,
        id: &Uuid,
        data: &UpdateRefreshToken,
        scope: Option<&TransactionScope>,
    ) -> AppResult<RefreshToken> {
        self.store
            .fetch_optional(
                "Failed to update refresh token",
                sqlx::query_as::<_, RefreshToken>(
                    "UPDATE refresh_tokens SET expires_at = COALESCE($2, expires_at), \
                                               revoked_at = COALESCE($3, revoked_at), \
                                               updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id)
                .bind(data.expires_at)
                .bind(data.revoked_at),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Refresh token {id} not found")))
    }

    async fn delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<RefreshToken> {
        self.store
            .fetch_optional(
                "Failed to delete refresh token",
                sqlx::query_as::<_, RefreshToken>(
                    "DELETE FROM refresh_tokens WHERE id = $1 RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Refresh token {id} not found")))
    }

    async fn soft_delete(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<RefreshToken> {
        self.store
            .fetch_optional(
                "Failed to soft-delete refresh token",
                sqlx::query_as::<_, RefreshToken>(
                    "UPDATE refresh_tokens SET deleted_at = NOW(), updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Refresh token {id} not found")))
    }

    async fn count(
        &self,
        filter: &RefreshTokenFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<u64> {
        let count: i64 = self
            .store
            .fetch_scalar(
                "Failed to count refresh tokens",
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM refresh_tokens \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR user_id = $2) \
                       AND (NOT $3 OR (revoked_at IS NULL AND expires_at > NOW()))",
                )
                .bind(filter.include_deleted)
                .bind(filter.user_id)
                .bind(filter.valid_only),
                scope,
            )
            .await?;
        Ok(count as u64)
    }

    async fn exists(
        &self,
        filter: &RefreshTokenFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<bool> {
        self.store
            .fetch_scalar(
                "Failed to check refresh token existence",
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM refresh_tokens \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR user_id = $2) \
                       AND (NOT $3 OR (revoked_at IS NULL AND expires_at > NOW())))",
                )
                .bind(filter.include_deleted)
                .bind(filter.user_id)
                .bind(filter.valid_only),
                scope,
            )
            .await
    }
}

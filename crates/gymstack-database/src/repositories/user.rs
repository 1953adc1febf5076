//! User repository implementation.

use async_trait::async_trait;
use uuid::Uuid;

use gymstack_core::error::{AppError, ErrorKind};
use gymstack_core::result::AppResult;
use gymstack_core::traits::Repository;
use gymstack_core::types::pagination::{PageRequest, PageResponse};
use gymstack_entity::user::{CreateUser, UpdateUser, User, UserFilter, UserRole};

use crate::scope::TransactionScope;
use crate::store::StoreAdapter;

/// Repository for user CRUD and query operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    store: StoreAdapter,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// Find a user by email (case-insensitive). Absence is not an error.
    pub async fn find_by_email(
        &self,
        email: &str,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Option<User>> {
        self.store
            .fetch_optional(
                "Failed to find user by email",
                sqlx::query_as::<_, User>(
                    "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL",
                )
                .bind(email),
                scope,
            )
            .await
    }

    /// List all live users holding the given role, newest first.
    pub async fn find_by_role(
        &self,
        role: UserRole,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Vec<User>> {
        self.store
            .fetch_all(
                "Failed to list users by role",
                sqlx::query_as::<_, User>(
                    "SELECT * FROM users WHERE role = $1 AND deleted_at IS NULL \
                     ORDER BY created_at DESC",
                )
                .bind(role),
                scope,
            )
            .await
    }
}

#[async_trait]
impl Repository for UserRepository {
    type Entity = User;
    type Id = Uuid;
    type Create = CreateUser;
    type Update = UpdateUser;
    type Filter = UserFilter;
    type Scope = TransactionScope;

    async fn find_by_id(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Option<User>> {
        self.store
            .fetch_optional(
                "Failed to find user by id",
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
                    .bind(*id),
                scope,
            )
            .await
    }

    async fn find_many(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
        scope: Option<&TransactionScope>,
    ) -> AppResult<PageResponse<User>> {
        let total = self.count(filter, scope).await?;

        let users = self
            .store
            .fetch_all(
                "Failed to list users",
                sqlx::query_as::<_, User>(
                    "SELECT * FROM users \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::text IS NULL OR LOWER(email) = LOWER($2)) \
                       AND ($3::user_role IS NULL OR role = $3) \
                       AND ($4::text IS NULL OR full_name ILIKE '%' || $4 || '%' \
                            OR email ILIKE '%' || $4 || '%') \
                     ORDER BY created_at DESC LIMIT $5 OFFSET $6",
                )
                .bind(filter.include_deleted)
                .bind(filter.email.as_deref())
                .bind(filter.role)
                .bind(filter.search.as_deref())
                .bind(page.limit() as i64)
                .bind(page.offset() as i64),
                scope,
            )
            .await?;

        Ok(PageResponse::new(users, page, total))
    }

    async fn create(&self, data: &CreateUser, scope: Option<&TransactionScope>) -> AppResult<User> {
        self.store
            .fetch_one(
                "Failed to create user",
                sqlx::query_as::<_, User>(
                    "INSERT INTO users (email, password_hash, full_name, phone, role) \
                     VALUES ($1, $2, $3, $4, $5) \
                     RETURNING *",
                )
                .bind(&data.email)
                .bind(&data.password_hash)
                .bind(&data.full_name)
                .bind(&data.phone)
                .bind(data.role),
                scope,
            )
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => {
                    AppError::conflict(format!("Email '{}' already in use", data.email))
                }
                _ => e,
            })
    }

    async fn update(
        &self,
        id: &Uuid,
        data: &UpdateUser,
        scope: Option<&TransactionScope>,
    ) -> AppResult<User> {
        self.store
            .fetch_optional(
                "Failed to update user",
                sqlx::query_as::<_, User>(
                    "UPDATE users SET email = COALESCE($2, email), \
                                      full_name = COALESCE($3, full_name), \
                                      phone = COALESCE($4, phone), \
                                      role = COALESCE($5, role), \
                                      updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id)
                .bind(&data.email)
                .bind(&data.full_name)
                .bind(&data.phone)
                .bind(data.role),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<User> {
        self.store
            .fetch_optional(
                "Failed to delete user",
                sqlx::query_as::<_, User>("DELETE FROM users WHERE id = $1 RETURNING *").bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn soft_delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<User> {
        self.store
            .fetch_optional(
                "Failed to soft-delete user",
                sqlx::query_as::<_, User>(
                    "UPDATE users SET deleted_at = NOW(), updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn count(&self, filter: &UserFilter, scope: Option<&TransactionScope>) -> AppResult<u64> {
        let count: i64 = self
            .store
            .fetch_scalar(
                "Failed to count users",
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM users \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::text IS NULL OR LOWER(email) = LOWER($2)) \
                       AND ($3::user_role IS NULL OR role = $3) \
                       AND ($4::text IS NULL OR full_name ILIKE '%' || $4 || '%' \
                            OR email ILIKE '%' || $4 || '%')",
                )
                .bind(filter.include_deleted)
                .bind(filter.email.as_deref())
                .bind(filter.role)
                .bind(filter.search.as_deref()),
                scope,
            )
            .await?;
        Ok(count as u64)
    }

    async fn exists(
        &self,
        filter: &UserFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<bool> {
        self.store
            .fetch_scalar(
                "Failed to check user existence",
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM users \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::text IS NULL OR LOWER(email) = LOWER($2)) \
                       AND ($3::user_role IS NULL OR role = $3) \
                       AND ($4::text IS NULL OR full_name ILIKE '%' || $4 || '%' \
                            OR email ILIKE '%' || $4 || '%'))",
                )
                .bind(filter.include_deleted)
                .bind(filter.email.as_deref())
                .bind(filter.role)
                .bind(filter.search.as_deref()),
                scope,
            )
            .await
    }
}

//! Academy repository implementation.

use async_trait::async_trait;
use uuid::Uuid;

use gymstack_core::error::{AppError, ErrorKind};
use gymstack_core::result::AppResult;
use gymstack_core::traits::Repository;
use gymstack_core::types::pagination::{PageRequest, PageResponse};
use gymstack_entity::academy::{Academy, AcademyFilter, CreateAcademy, UpdateAcademy};

use crate::scope::TransactionScope;
use crate::store::StoreAdapter;

/// Repository for academy CRUD and location queries.
#[derive(Debug, Clone)]
pub struct AcademyRepository {
    store: StoreAdapter,
}

impl AcademyRepository {
    /// Create a new academy repository.
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// List all academies belonging to one owner.
    pub async fn find_by_owner(
        &self,
        owner_id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Vec<Academy>> {
        self.store
            .fetch_all(
                "Failed to list academies by owner",
                sqlx::query_as::<_, Academy>(
                    "SELECT * FROM academies \
                     WHERE owner_id = $1 AND deleted_at IS NULL ORDER BY name ASC",
                )
                .bind(*owner_id),
                scope,
            )
            .await
    }

    /// Find academies within `radius_km` of a point, nearest first.
    ///
    /// Great-circle distance via the Haversine formula, computed in SQL
    /// over the stored latitude/longitude columns.
    pub async fn search_by_location(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Vec<Academy>> {
        self.store
            .fetch_all(
                "Failed to search academies by location",
                sqlx::query_as::<_, Academy>(
                    "SELECT * FROM ( \
                       SELECT a.*, \
                              6371.0 * 2 * asin(sqrt( \
                                pow(sin(radians(a.latitude - $1) / 2), 2) + \
                                cos(radians($1)) * cos(radians(a.latitude)) * \
                                pow(sin(radians(a.longitude - $2) / 2), 2) \
                              )) AS distance_km \
                       FROM academies a \
                       WHERE a.deleted_at IS NULL \
                     ) nearby \
                     WHERE distance_km <= $3 \
                     ORDER BY distance_km ASC",
                )
                .bind(latitude)
                .bind(longitude)
                .bind(radius_km),
                scope,
            )
            .await
    }
}

#[async_trait]
impl Repository for AcademyRepository {
    type Entity = Academy;
    type Id = Uuid;
    type Create = CreateAcademy;
    type Update = UpdateAcademy;
    type Filter = AcademyFilter;
    type Scope = TransactionScope;

    async fn find_by_id(
        &self,
        id: &Uuid,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Option<Academy>> {
        self.store
            .fetch_optional(
                "Failed to find academy by id",
                sqlx::query_as::<_, Academy>(
                    "SELECT * FROM academies WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(*id),
                scope,
            )
            .await
    }

    async fn find_many(
        &self,
        filter: &AcademyFilter,
        page: &PageRequest,
        scope: Option<&TransactionScope>,
    ) -> AppResult<PageResponse<Academy>> {
        let total = self.count(filter, scope).await?;

        let academies = self
            .store
            .fetch_all(
                "Failed to list academies",
                sqlx::query_as::<_, Academy>(
                    "SELECT * FROM academies \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR owner_id = $2) \
                       AND ($3::text IS NULL OR LOWER(city) = LOWER($3)) \
                       AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%') \
                     ORDER BY name ASC LIMIT $5 OFFSET $6",
                )
                .bind(filter.include_deleted)
                .bind(filter.owner_id)
                .bind(filter.city.as_deref())
                .bind(filter.search.as_deref())
                .bind(page.limit() as i64)
                .bind(page.offset() as i64),
                scope,
            )
            .await?;

        Ok(PageResponse::new(academies, page, total))
    }

    async fn create(
        &self,
        data: &CreateAcademy,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Academy> {
        self.store
            .fetch_one(
                "Failed to create academy",
                sqlx::query_as::<_, Academy>(
                    "INSERT INTO academies \
                       (owner_id, name, description, address, city, latitude, longitude) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7) \
                     RETURNING *",
                )
                .bind(data.owner_id)
                .bind(&data.name)
                .bind(&data.description)
                .bind(&data.address)
                .bind(&data.city)
                .bind(data.latitude)
                .bind(data.longitude),
                scope,
            )
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => AppError::conflict(format!(
                    "Academy '{}' conflicts with an existing record",
                    data.name
                )),
                _ => e,
            })
    }

    async fn update(
        &self,
        id: &Uuid,
        data: &UpdateAcademy,
        scope: Option<&TransactionScope>,
    ) -> AppResult<Academy> {
        self.store
            .fetch_optional(
                "Failed to update academy",
                sqlx::query_as::<_, Academy>(
                    "UPDATE academies SET name = COALESCE($2, name), \
                                          description = COALESCE($3, description), \
                                          address = COALESCE($4, address), \
                                          city = COALESCE($5, city), \
                                          latitude = COALESCE($6, latitude), \
                                          longitude = COALESCE($7, longitude), \
                                          updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id)
                .bind(&data.name)
                .bind(&data.description)
                .bind(&data.address)
                .bind(&data.city)
                .bind(data.latitude)
                .bind(data.longitude),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Academy {id} not found")))
    }

    async fn delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<Academy> {
        self.store
            .fetch_optional(
                "Failed to delete academy",
                sqlx::query_as::<_, Academy>("DELETE FROM academies WHERE id = $1 RETURNING *")
                    .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Academy {id} not found")))
    }

    async fn soft_delete(&self, id: &Uuid, scope: Option<&TransactionScope>) -> AppResult<Academy> {
        self.store
            .fetch_optional(
                "Failed to soft-delete academy",
                sqlx::query_as::<_, Academy>(
                    "UPDATE academies SET deleted_at = NOW(), updated_at = NOW() \
                     WHERE id = $1 AND deleted_at IS NULL RETURNING *",
                )
                .bind(*id),
                scope,
            )
            .await?
            .ok_or_else(|| AppError::not_found(format!("Academy {id} not found")))
    }

    async fn count(
        &self,
        filter: &AcademyFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<u64> {
        let count: i64 = self
            .store
            .fetch_scalar(
                "Failed to count academies",
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM academies \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR owner_id = $2) \
                       AND ($3::text IS NULL OR LOWER(city) = LOWER($3)) \
                       AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%')",
                )
                .bind(filter.include_deleted)
                .bind(filter.owner_id)
                .bind(filter.city.as_deref())
                .bind(filter.search.as_deref()),
                scope,
            )
            .await?;
        Ok(count as u64)
    }

    async fn exists(
        &self,
        filter: &AcademyFilter,
        scope: Option<&TransactionScope>,
    ) -> AppResult<bool> {
        self.store
            .fetch_scalar(
                "Failed to check academy existence",
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM academies \
                     WHERE ($1 OR deleted_at IS NULL) \
                       AND ($2::uuid IS NULL OR owner_id = $2) \
                       AND ($3::text IS NULL OR LOWER(city) = LOWER($3)) \
                       AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%'))",
                )
                .bind(filter.include_deleted)
                .bind(filter.owner_id)
                .bind(filter.city.as_deref())
                .bind(filter.search.as_deref()),
                scope,
            )
            .await
    }
}

//! Academy entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A gym or martial-arts academy managed on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Academy {
    /// Unique academy identifier.
    pub id: Uuid,
    /// The user who owns this academy.
    pub owner_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Street address.
    pub address: String,
    /// City name.
    pub city: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// When the academy was created.
    pub created_at: DateTime<Utc>,
    /// When the academy was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Data required to register a new academy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAcademy {
    /// Owning user.
    pub owner_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description (optional).
    pub description: Option<String>,
    /// Street address.
    pub address: String,
    /// City name.
    pub city: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Partial update for an academy. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAcademy {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New street address.
    pub address: Option<String>,
    /// New city.
    pub city: Option<String>,
    /// New latitude.
    pub latitude: Option<f64>,
    /// New longitude.
    pub longitude: Option<f64>,
}

/// Filter for academy queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcademyFilter {
    /// Restrict to academies of a single owner.
    pub owner_id: Option<Uuid>,
    /// Exact city match (case-insensitive).
    pub city: Option<String>,
    /// Substring match on name.
    pub search: Option<String>,
    /// Include soft-deleted academies.
    pub include_deleted: bool,
}

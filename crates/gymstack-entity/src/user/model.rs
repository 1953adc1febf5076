//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;

/// A registered user: an academy owner, a staff member, or a member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique email address, used for login.
    pub email: String,
    /// Password hash. Hashing policy lives outside this workspace.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Full legal name.
    pub full_name: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Role within the platform.
    pub role: UserRole,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; set means the user is logically removed.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the user is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address (unique).
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Full legal name.
    pub full_name: String,
    /// Contact phone number (optional).
    pub phone: Option<String>,
    /// Assigned role.
    pub role: UserRole,
}

/// Partial update for an existing user. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New email address.
    pub email: Option<String>,
    /// New full name.
    pub full_name: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New role.
    pub role: Option<UserRole>,
}

/// Filter for user list/count/exists queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    /// Exact email match (case-insensitive).
    pub email: Option<String>,
    /// Restrict to a single role.
    pub role: Option<UserRole>,
    /// Substring match on name or email.
    pub search: Option<String>,
    /// Include soft-deleted users.
    pub include_deleted: bool,
}

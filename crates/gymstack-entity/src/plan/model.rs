//! Membership plan entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A membership plan offered by an academy.
///
/// Prices are stored in minor units (cents) to avoid floating-point money.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    /// Unique plan identifier.
    pub id: Uuid,
    /// The academy offering this plan.
    pub academy_id: Uuid,
    /// Plan name, unique within its academy.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Price in minor currency units.
    pub price_cents: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Length of one billing period in days.
    pub duration_days: i32,
    /// Whether the plan can currently be subscribed to.
    pub active: bool,
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// When the plan was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Data required to create a new plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlan {
    /// The academy offering the plan.
    pub academy_id: Uuid,
    /// Plan name (unique within the academy).
    pub name: String,
    /// Free-form description (optional).
    pub description: Option<String>,
    /// Price in minor currency units.
    pub price_cents: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Length of one billing period in days.
    pub duration_days: i32,
}

/// Partial update for a plan. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlan {
    /// New plan name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New price in minor units.
    pub price_cents: Option<i64>,
    /// New billing period length in days.
    pub duration_days: Option<i32>,
    /// Activate or deactivate the plan.
    pub active: Option<bool>,
}

/// Filter for plan queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanFilter {
    /// Restrict to plans of a single academy.
    pub academy_id: Option<Uuid>,
    /// Restrict by active flag.
    pub active: Option<bool>,
    /// Include soft-deleted plans.
    pub include_deleted: bool,
}

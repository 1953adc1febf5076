//! Subscription entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::SubscriptionStatus;

/// A member's subscription to a plan.
///
/// At most one active subscription may exist per (user, plan) pair; the
/// store enforces this with a partial unique index.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    /// Unique subscription identifier.
    pub id: Uuid,
    /// The subscribing member.
    pub user_id: Uuid,
    /// The plan subscribed to.
    pub plan_id: Uuid,
    /// Lifecycle state.
    pub status: SubscriptionStatus,
    /// First day of access.
    pub starts_at: DateTime<Utc>,
    /// Last day of access under the current billing period.
    pub ends_at: DateTime<Utc>,
    /// When the subscription was cancelled, if it was.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// When the subscription was created.
    pub created_at: DateTime<Utc>,
    /// When the subscription was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Data required to open a new subscription. Starts in `Active` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscription {
    /// The subscribing member.
    pub user_id: Uuid,
    /// The plan subscribed to.
    pub plan_id: Uuid,
    /// First day of access.
    pub starts_at: DateTime<Utc>,
    /// Last day of access.
    pub ends_at: DateTime<Utc>,
}

/// Partial update for a subscription. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSubscription {
    /// New lifecycle state.
    pub status: Option<SubscriptionStatus>,
    /// New end of access (renewal).
    pub ends_at: Option<DateTime<Utc>>,
    /// Cancellation timestamp.
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Filter for subscription queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    /// Restrict to subscriptions of a single member.
    pub user_id: Option<Uuid>,
    /// Restrict to subscriptions of a single plan.
    pub plan_id: Option<Uuid>,
    /// Restrict by lifecycle state.
    pub status: Option<SubscriptionStatus>,
    /// Include soft-deleted subscriptions.
    pub include_deleted: bool,
}

//! Payment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{PaymentMethod, PaymentStatus};

/// A payment made against a subscription.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    /// Unique payment identifier.
    pub id: Uuid,
    /// The subscription this payment settles.
    pub subscription_id: Uuid,
    /// Amount in minor currency units.
    pub amount_cents: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Payment method.
    pub method: PaymentMethod,
    /// Settlement state.
    pub status: PaymentStatus,
    /// External provider reference, unique when present.
    pub reference: Option<String>,
    /// When the payment settled.
    pub paid_at: Option<DateTime<Utc>>,
    /// When the payment was registered.
    pub created_at: DateTime<Utc>,
    /// When the payment was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Data required to register a new payment. Starts in `Pending` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayment {
    /// The subscription being paid for.
    pub subscription_id: Uuid,
    /// Amount in minor currency units.
    pub amount_cents: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Payment method.
    pub method: PaymentMethod,
    /// External provider reference (unique, optional).
    pub reference: Option<String>,
}

/// Partial update for a payment. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePayment {
    /// New settlement state.
    pub status: Option<PaymentStatus>,
    /// Settlement timestamp.
    pub paid_at: Option<DateTime<Utc>>,
}

/// Filter for payment queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentFilter {
    /// Restrict to payments of a single subscription.
    pub subscription_id: Option<Uuid>,
    /// Restrict by settlement state.
    pub status: Option<PaymentStatus>,
    /// Include soft-deleted payments.
    pub include_deleted: bool,
}

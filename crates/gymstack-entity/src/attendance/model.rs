//! Attendance entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One visit of a member to an academy.
///
/// A record with no check-out time is an *open* visit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendance {
    /// Unique attendance identifier.
    pub id: Uuid,
    /// The visiting member.
    pub user_id: Uuid,
    /// The academy visited.
    pub academy_id: Uuid,
    /// Check-in time.
    pub checked_in_at: DateTime<Utc>,
    /// Check-out time, if the visit has ended.
    pub checked_out_at: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Attendance {
    /// Whether the member is still checked in.
    pub fn is_open(&self) -> bool {
        self.checked_out_at.is_none()
    }
}

/// Data required to record a check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    /// The visiting member.
    pub user_id: Uuid,
    /// The academy visited.
    pub academy_id: Uuid,
    /// Check-in time; defaults to now when omitted.
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Partial update for an attendance record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAttendance {
    /// Check-out time.
    pub checked_out_at: Option<DateTime<Utc>>,
}

/// Filter for attendance queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceFilter {
    /// Restrict to visits of a single member.
    pub user_id: Option<Uuid>,
    /// Restrict to visits at a single academy.
    pub academy_id: Option<Uuid>,
    /// Only visits without a check-out time.
    pub open_only: bool,
    /// Include soft-deleted records.
    pub include_deleted: bool,
}

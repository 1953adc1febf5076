//! Refresh token entity model.
//!
//! Tokens are stored hashed; issuing and validating the opaque token
//! value is the auth flow's concern, not this crate's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A refresh token issued to a user.
///
/// A token is *valid* when it has not expired, has not been revoked, and
/// has not been soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    /// Unique token identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Unique hash of the opaque token value.
    pub token_hash: String,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
    /// Revocation marker; set means the token can no longer be used.
    pub revoked_at: Option<DateTime<Utc>>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
    /// When the token was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Check validity at a given instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.deleted_at.is_none() && self.expires_at > now
    }
}

/// Data required to store a new refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRefreshToken {
    /// Owning user.
    pub user_id: Uuid,
    /// Hash of the opaque token value (unique).
    pub token_hash: String,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
}

/// Partial update for a stored token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRefreshToken {
    /// New expiry time (token rotation).
    pub expires_at: Option<DateTime<Utc>>,
    /// Revocation timestamp.
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Filter for refresh token queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshTokenFilter {
    /// Restrict to tokens of a single user.
    pub user_id: Option<Uuid>,
    /// Only tokens that are currently valid.
    pub valid_only: bool,
    /// Include soft-deleted tokens.
    pub include_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_in: i64) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "abc".to_string(),
            expires_at: now + Duration::seconds(expires_in),
            revoked_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_validity() {
        let now = Utc::now();
        assert!(token(60).is_valid_at(now));
        assert!(!token(-60).is_valid_at(now));

        let mut revoked = token(60);
        revoked.revoked_at = Some(now);
        assert!(!revoked.is_valid_at(now));
    }
}

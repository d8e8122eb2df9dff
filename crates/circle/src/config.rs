use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loyalty_core::ClientId;

/// Per-account delegation switches set by the holder.
///
/// An account with no config document denies both operations to members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleConfig {
    pub allow_member_credits: bool,
    pub allow_member_debits: bool,
    pub updated_at: DateTime<Utc>,
    pub updated_by: ClientId,
}

impl CircleConfig {
    /// The implicit state of an account that never had a config written:
    /// both switches off.
    pub fn denied(updated_by: ClientId, updated_at: DateTime<Utc>) -> Self {
        Self {
            allow_member_credits: false,
            allow_member_debits: false,
            updated_at,
            updated_by,
        }
    }

    /// Apply a partial update; absent fields keep their current value.
    pub fn apply(self, patch: CircleConfigPatch, updated_by: ClientId, updated_at: DateTime<Utc>) -> Self {
        Self {
            allow_member_credits: patch.allow_member_credits.unwrap_or(self.allow_member_credits),
            allow_member_debits: patch.allow_member_debits.unwrap_or(self.allow_member_debits),
            updated_at,
            updated_by,
        }
    }
}

/// Partial config update as sent by the holder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleConfigPatch {
    pub allow_member_credits: Option<bool>,
    pub allow_member_debits: Option<bool>,
}

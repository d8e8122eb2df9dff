use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use loyalty_circle::CircleMember;
use loyalty_clients::ProfileSnapshot;
use loyalty_core::GroupId;

/// Balance state around a credit/debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub points: i64,
}

/// Account state at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_name: String,
    pub points: i64,
}

/// Group state at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub name: String,
    pub description: String,
}

/// A client's group membership set around a join/leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupIdsSnapshot {
    pub affinity_group_ids: BTreeSet<GroupId>,
}

/// Delegation switches around a config update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub allow_member_credits: bool,
    pub allow_member_debits: bool,
}

/// Typed before/after snapshots, one variant per mutation path.
///
/// Snapshots are restricted to what changed: creations have no `before`,
/// removals no `after`. The variant tag is internal bookkeeping; the wire
/// shape is the plain `{before, after}` object from [`AuditChanges::to_wire`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditChanges {
    Profile {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before: Option<ProfileSnapshot>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after: Option<ProfileSnapshot>,
    },
    Balance {
        before: BalanceSnapshot,
        after: BalanceSnapshot,
    },
    Account {
        after: AccountSnapshot,
    },
    Group {
        after: GroupSnapshot,
    },
    GroupMembership {
        before: GroupIdsSnapshot,
        after: GroupIdsSnapshot,
    },
    CircleMember {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before: Option<CircleMember>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after: Option<CircleMember>,
    },
    CircleConfig {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before: Option<ConfigSnapshot>,
        after: ConfigSnapshot,
    },
}

impl AuditChanges {
    /// The wire `{before, after}` object, without the internal variant tag.
    pub fn to_wire(&self) -> serde_json::Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.remove("kind");
        }
        Ok(value)
    }
}

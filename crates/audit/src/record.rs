use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use loyalty_auth::Actor;
use loyalty_circle::CircleMember;
use loyalty_clients::{ProfileDiff, ProfileSnapshot};
use loyalty_core::{AccountId, AuditRecordId, ClientId, GroupId, TransactionId};

use crate::action::{AuditAction, ResourceType};
use crate::snapshot::{
    AccountSnapshot, AuditChanges, BalanceSnapshot, ConfigSnapshot, GroupIdsSnapshot,
    GroupSnapshot,
};

/// Free-form context attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMetadata {
    pub description: String,
}

/// One immutable audit record.
///
/// Written once inside the mutating operation's atomic unit, never updated.
/// `resource_id` names the primary mutated entity; the optional ids
/// cross-reference whatever the resource is scoped under. Record ids are
/// UUIDv7, so ids order by creation time within equal timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditRecordId,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    pub actor: Actor,
    pub changes: AuditChanges,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AuditMetadata>,
}

impl AuditRecord {
    fn base(
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: Uuid,
        actor: Actor,
        changes: AuditChanges,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditRecordId::new(),
            timestamp,
            action,
            resource_type,
            resource_id,
            client_id: None,
            account_id: None,
            group_id: None,
            transaction_id: None,
            actor,
            changes,
            metadata: None,
        }
    }

    pub fn client_registered(
        actor: Actor,
        client_id: ClientId,
        after: ProfileSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            AuditAction::ClientRegistered,
            ResourceType::Client,
            client_id.into(),
            actor,
            AuditChanges::Profile {
                before: None,
                after: Some(after),
            },
            timestamp,
        );
        record.client_id = Some(client_id);
        record
    }

    pub fn client_updated(
        actor: Actor,
        client_id: ClientId,
        diff: ProfileDiff,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            AuditAction::ClientUpdated,
            ResourceType::Client,
            client_id.into(),
            actor,
            AuditChanges::Profile {
                before: Some(diff.before),
                after: Some(diff.after),
            },
            timestamp,
        );
        record.client_id = Some(client_id);
        record
    }

    pub fn account_created(
        actor: Actor,
        client_id: ClientId,
        account_id: AccountId,
        after: AccountSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            AuditAction::AccountCreated,
            ResourceType::Account,
            account_id.into(),
            actor,
            AuditChanges::Account { after },
            timestamp,
        );
        record.client_id = Some(client_id);
        record.account_id = Some(account_id);
        record
    }

    /// Shared by the credit and debit paths; the action says which one.
    #[allow(clippy::too_many_arguments)]
    pub fn balance_changed(
        action: AuditAction,
        actor: Actor,
        client_id: ClientId,
        account_id: AccountId,
        transaction_id: TransactionId,
        before_points: i64,
        after_points: i64,
        description: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            action,
            ResourceType::Account,
            account_id.into(),
            actor,
            AuditChanges::Balance {
                before: BalanceSnapshot {
                    points: before_points,
                },
                after: BalanceSnapshot {
                    points: after_points,
                },
            },
            timestamp,
        );
        record.client_id = Some(client_id);
        record.account_id = Some(account_id);
        record.transaction_id = Some(transaction_id);
        if !description.is_empty() {
            record.metadata = Some(AuditMetadata { description });
        }
        record
    }

    pub fn group_created(
        actor: Actor,
        group_id: GroupId,
        after: GroupSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            AuditAction::GroupCreated,
            ResourceType::Group,
            group_id.into(),
            actor,
            AuditChanges::Group { after },
            timestamp,
        );
        record.group_id = Some(group_id);
        record
    }

    pub fn group_membership_changed(
        actor: Actor,
        client_id: ClientId,
        group_id: GroupId,
        before: BTreeSet<GroupId>,
        after: BTreeSet<GroupId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            AuditAction::GroupMembershipChanged,
            ResourceType::Client,
            client_id.into(),
            actor,
            AuditChanges::GroupMembership {
                before: GroupIdsSnapshot {
                    affinity_group_ids: before,
                },
                after: GroupIdsSnapshot {
                    affinity_group_ids: after,
                },
            },
            timestamp,
        );
        record.client_id = Some(client_id);
        record.group_id = Some(group_id);
        record
    }

    pub fn circle_member_added(
        actor: Actor,
        holder_id: ClientId,
        member: CircleMember,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            AuditAction::CircleMemberAdded,
            ResourceType::FamilyCircle,
            holder_id.into(),
            actor,
            AuditChanges::CircleMember {
                before: None,
                after: Some(member),
            },
            timestamp,
        );
        record.client_id = Some(holder_id);
        record
    }

    pub fn circle_member_removed(
        actor: Actor,
        holder_id: ClientId,
        member: CircleMember,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            AuditAction::CircleMemberRemoved,
            ResourceType::FamilyCircle,
            holder_id.into(),
            actor,
            AuditChanges::CircleMember {
                before: Some(member),
                after: None,
            },
            timestamp,
        );
        record.client_id = Some(holder_id);
        record
    }

    pub fn circle_config_updated(
        actor: Actor,
        client_id: ClientId,
        account_id: AccountId,
        before: Option<ConfigSnapshot>,
        after: ConfigSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::base(
            AuditAction::CircleConfigUpdated,
            ResourceType::FamilyCircleConfig,
            account_id.into(),
            actor,
            AuditChanges::CircleConfig { before, after },
            timestamp,
        );
        record.client_id = Some(client_id);
        record.account_id = Some(account_id);
        record
    }
}

use serde::Deserialize;

use loyalty_audit::AuditRecord;
use loyalty_circle::{CircleConfig, CircleMember};
use loyalty_clients::{AffinityGroup, Client};
use loyalty_core::{AccountId, ClientId, GroupId};
use loyalty_infra::query::Page;
use loyalty_ledger::{LoyaltyAccount, PointsTransaction};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterClientRequest {
    pub name: String,
    pub email: Option<String>,
    pub identity_document: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub account_name: String,
}

#[derive(Debug, Deserialize)]
pub struct MovePointsRequest {
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddCircleMemberRequest {
    pub member_id: String,
    pub relationship_type: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub transaction_type: Option<String>,
    pub start_date: Option<String>, // RFC3339
    pub end_date: Option<String>,   // RFC3339
    pub limit: Option<u32>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuditListQuery {
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub client_id: Option<String>,
    pub account_id: Option<String>,
    pub group_id: Option<String>,
    pub transaction_id: Option<String>,
    pub start_date: Option<String>, // RFC3339
    pub end_date: Option<String>,   // RFC3339
    pub limit: Option<u32>,
    pub next_cursor: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn client_to_json(client_id: ClientId, client: &Client) -> serde_json::Value {
    serde_json::json!({
        "id": client_id.to_string(),
        "name": client.name,
        "email": client.email,
        "identity_document": client.identity_document,
        "account_balances": client.account_balances,
        "affinity_group_ids": client.affinity_group_ids,
        "family_circle": client.family_circle,
        "created_at": client.created_at.to_rfc3339(),
        "updated_at": client.updated_at.to_rfc3339(),
    })
}

pub fn account_to_json(account_id: AccountId, account: &LoyaltyAccount) -> serde_json::Value {
    serde_json::json!({
        "id": account_id.to_string(),
        "account_name": account.account_name,
        "points": account.points,
        "created_at": account.created_at.to_rfc3339(),
        "updated_at": account.updated_at.to_rfc3339(),
    })
}

pub fn transaction_to_json(transaction: &PointsTransaction) -> serde_json::Value {
    serde_json::json!({
        "id": transaction.id.to_string(),
        "transaction_type": transaction.transaction_type.to_string(),
        "amount": transaction.amount,
        "description": transaction.description,
        "timestamp": transaction.timestamp.to_rfc3339(),
        "originated_by": transaction.originated_by,
    })
}

pub fn group_to_json(group_id: GroupId, group: &AffinityGroup) -> serde_json::Value {
    serde_json::json!({
        "id": group_id.to_string(),
        "name": group.name,
        "description": group.description,
        "created_at": group.created_at.to_rfc3339(),
        "updated_at": group.updated_at.to_rfc3339(),
    })
}

pub fn circle_member_to_json(member: &CircleMember) -> serde_json::Value {
    serde_json::json!({
        "client_id": member.client_id.to_string(),
        "relationship_type": member.relationship_type.as_str(),
        "joined_at": member.joined_at.to_rfc3339(),
    })
}

pub fn circle_config_to_json(config: &CircleConfig) -> serde_json::Value {
    serde_json::json!({
        "allow_member_credits": config.allow_member_credits,
        "allow_member_debits": config.allow_member_debits,
        "updated_at": config.updated_at.to_rfc3339(),
        "updated_by": config.updated_by.to_string(),
    })
}

pub fn audit_record_to_json(record: &AuditRecord) -> serde_json::Value {
    serde_json::json!({
        "id": record.id.to_string(),
        "timestamp": record.timestamp.to_rfc3339(),
        "action": record.action.as_str(),
        "resource_type": record.resource_type.as_str(),
        "resource_id": record.resource_id.to_string(),
        "client_id": record.client_id.map(|v| v.to_string()),
        "account_id": record.account_id.map(|v| v.to_string()),
        "group_id": record.group_id.map(|v| v.to_string()),
        "transaction_id": record.transaction_id.map(|v| v.to_string()),
        "actor": {
            "uid": record.actor.uid.to_string(),
            "email": record.actor.email,
        },
        "changes": record
            .changes
            .to_wire()
            .unwrap_or_else(|_| serde_json::json!({})),
        "metadata": record.metadata.as_ref().map(|m| serde_json::json!({
            "description": m.description,
        })),
    })
}

/// The `{data, paging}` envelope shared by every cursor-paged listing.
pub fn page_to_json<T>(
    page: &Page<T>,
    item_to_json: impl Fn(&T) -> serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "data": page.items.iter().map(item_to_json).collect::<Vec<_>>(),
        "paging": {
            "next_cursor": page.next_cursor,
        },
    })
}

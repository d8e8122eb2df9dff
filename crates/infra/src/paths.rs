//! Document path layout.
//!
//! Client documents own an `accounts` subcollection; each account owns a
//! `transactions` subcollection and one `family-circle-config` document.
//! Audit records and affinity groups live in top-level collections.

use loyalty_core::{AccountId, AuditRecordId, ClientId, GroupId, TransactionId};

use crate::document_store::DocPath;

pub const CLIENTS: &str = "clients";
pub const AUDIT_LOGS: &str = "audit_logs";
pub const GROUPS: &str = "affinity_groups";

pub fn client(client_id: ClientId) -> DocPath {
    DocPath::new(CLIENTS, client_id)
}

pub fn accounts(client_id: ClientId) -> String {
    format!("{CLIENTS}/{client_id}/accounts")
}

pub fn account(client_id: ClientId, account_id: AccountId) -> DocPath {
    DocPath::new(accounts(client_id), account_id)
}

pub fn transactions(client_id: ClientId, account_id: AccountId) -> String {
    format!("{CLIENTS}/{client_id}/accounts/{account_id}/transactions")
}

pub fn transaction(
    client_id: ClientId,
    account_id: AccountId,
    transaction_id: TransactionId,
) -> DocPath {
    DocPath::new(transactions(client_id, account_id), transaction_id)
}

/// The single per-account permission document.
pub fn circle_config(client_id: ClientId, account_id: AccountId) -> DocPath {
    DocPath::new(
        format!("{CLIENTS}/{client_id}/accounts/{account_id}/config"),
        "family-circle-config",
    )
}

pub fn audit_record(id: AuditRecordId) -> DocPath {
    DocPath::new(AUDIT_LOGS, id)
}

pub fn group(group_id: GroupId) -> DocPath {
    DocPath::new(GROUPS, group_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_follows_the_ownership_chain() {
        let client_id = ClientId::new();
        let account_id = AccountId::new();
        let transaction_id = TransactionId::new();

        let path = transaction(client_id, account_id, transaction_id);
        assert_eq!(
            path.collection(),
            format!("clients/{client_id}/accounts/{account_id}/transactions")
        );
        assert_eq!(path.doc_id(), transaction_id.to_string());

        let config = circle_config(client_id, account_id);
        assert_eq!(config.doc_id(), "family-circle-config");
    }

    #[test]
    fn account_paths_sit_under_their_client() {
        let client_id = ClientId::new();
        let account_id = AccountId::new();
        assert_eq!(
            account(client_id, account_id).collection(),
            accounts(client_id)
        );
    }
}

//! The transaction executor: balance mutation as one atomic unit.
//!
//! Every credit or debit runs as a single transactional unit that reads the
//! account, the holder's client document and (for delegated actors) the
//! membership and config documents, then stages exactly four writes: the
//! updated account, the new transaction record, the new audit record, and
//! the refreshed denormalized balance on the client document. All four land
//! or none do; there is no interleaving where a transaction exists without
//! its audit record or balance update.

use chrono::Utc;

use loyalty_audit::{AuditAction, AuditRecord};
use loyalty_auth::Actor;
use loyalty_circle::{CircleConfig, authorize_operation};
use loyalty_clients::Client;
use loyalty_core::{AccountId, AuditRecordId, ClientId, DomainError};
use loyalty_ledger::{LoyaltyAccount, PointsTransaction, TransactionType, validate_amount};

use crate::document_store::{DocumentStore, run_transaction};
use crate::error::ServiceError;
use crate::paths;

/// One requested balance mutation.
#[derive(Debug, Clone)]
pub struct LedgerCommand {
    /// The account holder, not necessarily the actor.
    pub client_id: ClientId,
    pub account_id: AccountId,
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub description: String,
}

/// Outcome of a committed unit.
#[derive(Debug, Clone)]
pub struct LedgerReceipt {
    pub transaction: PointsTransaction,
    pub balance_after: i64,
    pub audit_record_id: AuditRecordId,
}

pub struct LedgerExecutor<S> {
    store: S,
}

impl<S> LedgerExecutor<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Execute a credit or debit as one atomic unit.
    ///
    /// The amount is validated before any store access. Authorization reads
    /// (the actor's membership, the account's config) happen inside the
    /// unit, so a concurrent permission flip cannot race a delegated
    /// operation: it invalidates this commit instead.
    pub async fn execute(
        &self,
        actor: &Actor,
        command: LedgerCommand,
    ) -> Result<LedgerReceipt, ServiceError> {
        validate_amount(command.amount)?;

        run_transaction(&self.store, |txn| {
            let actor = actor.clone();
            let command = command.clone();
            Box::pin(async move {
                let now = Utc::now();

                let holder_path = paths::client(command.client_id);
                let mut holder: Client = txn
                    .get_typed(&holder_path)
                    .await?
                    .ok_or_else(|| DomainError::not_found("client not found"))?;

                let account_path = paths::account(command.client_id, command.account_id);
                let mut account: LoyaltyAccount = txn
                    .get_typed(&account_path)
                    .await?
                    .ok_or_else(|| DomainError::not_found("account not found"))?;

                let operation = command.transaction_type.as_operation();
                let originated_by = if actor.uid == command.client_id {
                    authorize_operation(actor.uid, command.client_id, None, None, operation)?
                } else {
                    let actor_doc: Option<Client> =
                        txn.get_typed(&paths::client(actor.uid)).await?;
                    let config: Option<CircleConfig> = txn
                        .get_typed(&paths::circle_config(command.client_id, command.account_id))
                        .await?;
                    authorize_operation(
                        actor.uid,
                        command.client_id,
                        actor_doc.as_ref().and_then(|c| c.family_circle.as_ref()),
                        config.as_ref(),
                        operation,
                    )?
                };

                let before_points = account.points;
                match command.transaction_type {
                    TransactionType::Credit => account.apply_credit(command.amount, now)?,
                    TransactionType::Debit => account.apply_debit(command.amount, now)?,
                }

                let transaction = PointsTransaction::record(
                    command.transaction_type,
                    command.amount,
                    command.description.clone(),
                    originated_by,
                    now,
                )?;

                let action = match command.transaction_type {
                    TransactionType::Credit => AuditAction::PointsCredited,
                    TransactionType::Debit => AuditAction::PointsDebited,
                };
                let audit = AuditRecord::balance_changed(
                    action,
                    actor.clone(),
                    command.client_id,
                    command.account_id,
                    transaction.id,
                    before_points,
                    account.points,
                    command.description.clone(),
                    now,
                );

                holder.note_balance(command.account_id, account.points, now);

                txn.put(account_path, &account)?;
                txn.put(
                    paths::transaction(command.client_id, command.account_id, transaction.id),
                    &transaction,
                )?;
                txn.put(paths::audit_record(audit.id), &audit)?;
                txn.put(holder_path, &holder)?;

                Ok::<_, ServiceError>(LedgerReceipt {
                    transaction,
                    balance_after: account.points,
                    audit_record_id: audit.id,
                })
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use loyalty_circle::{CircleConfigPatch, RelationshipType, add_member};
    use loyalty_ledger::TransactionType;

    use crate::document_store::{DocumentStore, InMemoryDocumentStore, WriteOp};

    use super::*;

    fn credit(client_id: ClientId, account_id: AccountId, amount: i64) -> LedgerCommand {
        LedgerCommand {
            client_id,
            account_id,
            transaction_type: TransactionType::Credit,
            amount,
            description: "welcome bonus".to_string(),
        }
    }

    fn debit(client_id: ClientId, account_id: AccountId, amount: i64) -> LedgerCommand {
        LedgerCommand {
            client_id,
            account_id,
            transaction_type: TransactionType::Debit,
            amount,
            description: "redemption".to_string(),
        }
    }

    async fn seed_holder(store: &InMemoryDocumentStore, points: i64) -> (ClientId, AccountId) {
        let now = Utc::now();
        let client_id = ClientId::new();
        let account_id = AccountId::new();

        let mut client = Client::register("Holder", None, None, now).unwrap();
        let mut account = LoyaltyAccount::open("main", now).unwrap();
        if points > 0 {
            account.apply_credit(points, now).unwrap();
        }
        client.note_balance(account_id, account.points, now);

        store
            .commit(
                vec![],
                vec![
                    WriteOp::put(paths::client(client_id), &client).unwrap(),
                    WriteOp::put(paths::account(client_id, account_id), &account).unwrap(),
                ],
            )
            .await
            .unwrap();

        (client_id, account_id)
    }

    /// Wire `member_id` into `holder_id`'s circle directly in the store.
    async fn seed_membership(
        store: &InMemoryDocumentStore,
        holder_id: ClientId,
        member_id: ClientId,
    ) {
        let now = Utc::now();
        let mut holder: Client = store
            .get(&paths::client(holder_id))
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        let mut member = Client::register("Member", None, None, now).unwrap();

        let (holder_role, member_role) = add_member(
            holder_id,
            member_id,
            RelationshipType::new("child"),
            now,
            holder.family_circle.take(),
            member.family_circle.take(),
        )
        .unwrap();
        holder.family_circle = Some(holder_role);
        member.family_circle = Some(member_role);

        store
            .commit(
                vec![],
                vec![
                    WriteOp::put(paths::client(holder_id), &holder).unwrap(),
                    WriteOp::put(paths::client(member_id), &member).unwrap(),
                ],
            )
            .await
            .unwrap();
    }

    async fn allow_member_credits(
        store: &InMemoryDocumentStore,
        holder_id: ClientId,
        account_id: AccountId,
    ) {
        let config = CircleConfig::denied(holder_id, Utc::now()).apply(
            CircleConfigPatch {
                allow_member_credits: Some(true),
                allow_member_debits: None,
            },
            holder_id,
            Utc::now(),
        );
        store
            .commit(
                vec![],
                vec![WriteOp::put(paths::circle_config(holder_id, account_id), &config).unwrap()],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn credit_stages_all_four_writes() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let (client_id, account_id) = seed_holder(&store, 0).await;
        let actor = Actor::new(client_id, "holder@example.com");
        let executor = LedgerExecutor::new(Arc::clone(&store));

        let receipt = executor
            .execute(&actor, credit(client_id, account_id, 1000))
            .await
            .unwrap();

        assert_eq!(receipt.balance_after, 1000);
        assert_eq!(receipt.transaction.amount, 1000);
        assert_eq!(receipt.transaction.originated_by, None);

        let account: LoyaltyAccount = store
            .get(&paths::account(client_id, account_id))
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(account.points, 1000);

        let transactions = store
            .list(&paths::transactions(client_id, account_id))
            .await
            .unwrap();
        assert_eq!(transactions.len(), 1);

        let audits = store.list(paths::AUDIT_LOGS).await.unwrap();
        assert_eq!(audits.len(), 1);
        let audit: AuditRecord = audits[0].decode().unwrap();
        assert_eq!(audit.action, AuditAction::PointsCredited);
        assert_eq!(audit.client_id, Some(client_id));
        assert_eq!(audit.account_id, Some(account_id));
        assert_eq!(audit.transaction_id, Some(receipt.transaction.id));

        let client: Client = store
            .get(&paths::client(client_id))
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(client.account_balances.get(&account_id), Some(&1000));
    }

    #[tokio::test]
    async fn rejected_debit_leaves_no_partial_writes() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let (client_id, account_id) = seed_holder(&store, 1000).await;
        let actor = Actor::new(client_id, "holder@example.com");
        let executor = LedgerExecutor::new(Arc::clone(&store));

        let err = executor
            .execute(&actor, debit(client_id, account_id, 1500))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::InsufficientBalance {
                balance: 1000,
                requested: 1500,
            })
        ));

        let account: LoyaltyAccount = store
            .get(&paths::account(client_id, account_id))
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(account.points, 1000);
        assert!(
            store
                .list(&paths::transactions(client_id, account_id))
                .await
                .unwrap()
                .is_empty()
        );
        assert!(store.list(paths::AUDIT_LOGS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_positive_amounts_fail_before_any_store_access() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let actor = Actor::new(ClientId::new(), "nobody@example.com");
        let executor = LedgerExecutor::new(Arc::clone(&store));

        // An empty store would produce NOT_FOUND if the check ran after the
        // reads; VALIDATION proves it runs first.
        let err = executor
            .execute(&actor, credit(ClientId::new(), AccountId::new(), 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let (client_id, _) = seed_holder(&store, 0).await;
        let actor = Actor::new(client_id, "holder@example.com");
        let executor = LedgerExecutor::new(Arc::clone(&store));

        let err = executor
            .execute(&actor, credit(client_id, AccountId::new(), 10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn stranger_is_forbidden() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let (client_id, account_id) = seed_holder(&store, 100).await;
        let executor = LedgerExecutor::new(Arc::clone(&store));

        let stranger = Actor::new(ClientId::new(), "stranger@example.com");
        let err = executor
            .execute(&stranger, credit(client_id, account_id, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Forbidden)));
    }

    #[tokio::test]
    async fn member_operations_follow_the_config_switches() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let (holder_id, account_id) = seed_holder(&store, 100).await;
        let member_id = ClientId::new();
        seed_membership(&store, holder_id, member_id).await;

        let member = Actor::new(member_id, "member@example.com");
        let executor = LedgerExecutor::new(Arc::clone(&store));

        // No config document written yet: both switches deny.
        let err = executor
            .execute(&member, credit(holder_id, account_id, 50))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::PermissionDenied(_))
        ));

        allow_member_credits(&store, holder_id, account_id).await;

        let receipt = executor
            .execute(&member, credit(holder_id, account_id, 50))
            .await
            .unwrap();
        assert_eq!(receipt.balance_after, 150);
        let originated_by = receipt.transaction.originated_by.expect("delegated");
        assert_eq!(originated_by.client_id, member_id);
        assert!(originated_by.is_circle_member);
        assert_eq!(originated_by.relationship_type.as_str(), "child");

        // Debits stay gated by their own switch.
        let err = executor
            .execute(&member, debit(holder_id, account_id, 10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::PermissionDenied(_))
        ));
    }
}

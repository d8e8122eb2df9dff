//! Read-side queries: paginated transaction and audit history.
//!
//! Pagination is keyset-based over `(timestamp, id)` descending. Record ids
//! are UUIDv7, so the id tiebreak keeps creation order within equal
//! timestamps, and a cursor resumes exactly after the last returned row
//! even while new records keep arriving.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use loyalty_audit::{AuditAction, AuditRecord, ResourceType};
use loyalty_auth::Actor;
use loyalty_clients::Client;
use loyalty_core::{
    AccountId, ClientId, DomainError, DomainResult, GroupId, TransactionId,
};
use loyalty_ledger::{PointsTransaction, TransactionType};

use crate::directory::can_view;
use crate::document_store::DocumentStore;
use crate::error::ServiceError;
use crate::paths;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

/// A validated page request.
#[derive(Debug, Clone)]
pub struct PageRequest {
    limit: u32,
    cursor: Option<String>,
}

impl PageRequest {
    /// Build a request from raw query parameters.
    ///
    /// `limit` defaults to 20 and must lie in `1..=100`. The cursor is only
    /// decoded when the page is assembled, so a malformed one surfaces as
    /// the same validation error either way.
    pub fn new(limit: Option<u32>, cursor: Option<String>) -> DomainResult<Self> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit < 1 || limit > MAX_LIMIT {
            return Err(DomainError::validation("limit must be between 1 and 100"));
        }
        Ok(Self { limit, cursor })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// One page of results plus the continuation token, if more rows exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Opaque continuation token: the sort key of the last returned row.
#[derive(Debug, Serialize, Deserialize)]
struct PageCursor {
    timestamp: DateTime<Utc>,
    id: Uuid,
}

impl PageCursor {
    fn encode(&self) -> DomainResult<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| DomainError::validation("invalid cursor"))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(token: &str) -> DomainResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| DomainError::validation("invalid cursor"))?;
        serde_json::from_slice(&bytes).map_err(|_| DomainError::validation("invalid cursor"))
    }
}

/// Sort, resume after the cursor, and slice one page off `items`.
fn paginate<T>(
    mut items: Vec<T>,
    key: impl Fn(&T) -> (DateTime<Utc>, Uuid),
    page: &PageRequest,
) -> DomainResult<Page<T>> {
    let cursor = page
        .cursor
        .as_deref()
        .map(PageCursor::decode)
        .transpose()?;

    items.sort_by(|a, b| key(b).cmp(&key(a)));
    if let Some(c) = cursor {
        // Strictly after the cursor row in descending order.
        items.retain(|item| {
            let (ts, id) = key(item);
            ts < c.timestamp || (ts == c.timestamp && id < c.id)
        });
    }

    let limit = page.limit as usize;
    let has_more = items.len() > limit;
    items.truncate(limit);

    let next_cursor = match (has_more, items.last()) {
        (true, Some(last)) => {
            let (timestamp, id) = key(last);
            Some(PageCursor { timestamp, id }.encode()?)
        }
        _ => None,
    };

    Ok(Page { items, next_cursor })
}

/// Transaction history filter. All present fields must match; dates are
/// inclusive on the transaction timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    fn matches(&self, transaction: &PointsTransaction) -> bool {
        if self
            .transaction_type
            .is_some_and(|t| t != transaction.transaction_type)
        {
            return false;
        }
        if self.start_date.is_some_and(|d| transaction.timestamp < d) {
            return false;
        }
        if self.end_date.is_some_and(|d| transaction.timestamp > d) {
            return false;
        }
        true
    }
}

/// Audit trail filter. All present fields must match; dates are inclusive
/// on the record timestamp. A `client_id` filter matches records about
/// that client as well as records performed by them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditFilter {
    pub action: Option<AuditAction>,
    pub resource_type: Option<ResourceType>,
    pub client_id: Option<ClientId>,
    pub account_id: Option<AccountId>,
    pub group_id: Option<GroupId>,
    pub transaction_id: Option<TransactionId>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl AuditFilter {
    fn matches(&self, record: &AuditRecord) -> bool {
        if self.action.is_some_and(|a| a != record.action) {
            return false;
        }
        if self
            .resource_type
            .is_some_and(|r| r != record.resource_type)
        {
            return false;
        }
        if self
            .client_id
            .is_some_and(|c| record.client_id != Some(c) && record.actor.uid != c)
        {
            return false;
        }
        if self
            .account_id
            .is_some_and(|a| record.account_id != Some(a))
        {
            return false;
        }
        if self.group_id.is_some_and(|g| record.group_id != Some(g)) {
            return false;
        }
        if self
            .transaction_id
            .is_some_and(|t| record.transaction_id != Some(t))
        {
            return false;
        }
        if self.start_date.is_some_and(|d| record.timestamp < d) {
            return false;
        }
        if self.end_date.is_some_and(|d| record.timestamp > d) {
            return false;
        }
        true
    }
}

/// An audit record is visible to the actor who wrote it and to the client
/// it is about.
fn visible_to(record: &AuditRecord, actor: &Actor) -> bool {
    record.actor.uid == actor.uid || record.client_id == Some(actor.uid)
}

pub struct LedgerQueries<S> {
    store: S,
}

impl<S> LedgerQueries<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Transaction history of one account, newest first.
    pub async fn transactions(
        &self,
        actor: &Actor,
        client_id: ClientId,
        account_id: AccountId,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<PointsTransaction>, ServiceError> {
        let client: Client = self
            .store
            .get(&paths::client(client_id))
            .await?
            .ok_or_else(|| DomainError::not_found("client not found"))?
            .decode()?;
        if !can_view(actor, client_id, &client) {
            return Err(DomainError::Forbidden.into());
        }
        self.store
            .get(&paths::account(client_id, account_id))
            .await?
            .ok_or_else(|| DomainError::not_found("account not found"))?;

        let docs = self
            .store
            .list(&paths::transactions(client_id, account_id))
            .await?;
        let mut rows = Vec::with_capacity(docs.len());
        for doc in &docs {
            let transaction: PointsTransaction = doc.decode()?;
            if filter.matches(&transaction) {
                rows.push(transaction);
            }
        }

        let page = paginate(rows, |t| (t.timestamp, *t.id.as_uuid()), &page)?;
        Ok(page)
    }

    /// The audit trail slice visible to the actor, newest first.
    pub async fn audit_records(
        &self,
        actor: &Actor,
        filter: AuditFilter,
        page: PageRequest,
    ) -> Result<Page<AuditRecord>, ServiceError> {
        let docs = self.store.list(paths::AUDIT_LOGS).await?;
        let mut rows = Vec::with_capacity(docs.len());
        for doc in &docs {
            let record: AuditRecord = doc.decode()?;
            if visible_to(&record, actor) && filter.matches(&record) {
                rows.push(record);
            }
        }

        let page = paginate(rows, |r| (r.timestamp, *r.id.as_uuid()), &page)?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::Duration;

    use loyalty_audit::AuditAction;
    use loyalty_auth::Actor;
    use loyalty_clients::Client;
    use loyalty_core::AuditRecordId;

    use crate::document_store::{InMemoryDocumentStore, WriteOp};

    use super::*;

    #[test]
    fn limit_defaults_and_bounds() {
        assert_eq!(PageRequest::new(None, None).unwrap().limit(), 20);
        assert_eq!(PageRequest::new(Some(1), None).unwrap().limit(), 1);
        assert_eq!(PageRequest::new(Some(100), None).unwrap().limit(), 100);
        assert!(PageRequest::new(Some(0), None).is_err());
        assert!(PageRequest::new(Some(101), None).is_err());
    }

    #[test]
    fn cursor_round_trips_and_rejects_tampering() {
        let cursor = PageCursor {
            timestamp: Utc::now(),
            id: Uuid::now_v7(),
        };
        let token = cursor.encode().unwrap();
        let back = PageCursor::decode(&token).unwrap();
        assert_eq!(back.timestamp, cursor.timestamp);
        assert_eq!(back.id, cursor.id);

        let err = PageCursor::decode("not!a!cursor").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = PageCursor::decode(&URL_SAFE_NO_PAD.encode(b"{}")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn pages_walk_newest_first_without_gaps() {
        let base = Utc::now();
        // Two rows share a timestamp; the v7 id breaks the tie.
        let mut rows: Vec<(DateTime<Utc>, Uuid)> = (0..7)
            .map(|i| (base + Duration::seconds(i / 2), Uuid::now_v7()))
            .collect();
        rows.sort_by(|a, b| b.cmp(a));
        let expected = rows.clone();

        let mut walked = Vec::new();
        let mut cursor = None;
        loop {
            let page = paginate(
                rows.clone(),
                |row| (row.0, row.1),
                &PageRequest::new(Some(3), cursor.clone()).unwrap(),
            )
            .unwrap();
            walked.extend(page.items);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(walked, expected);
        let unique: HashSet<Uuid> = walked.iter().map(|row| row.1).collect();
        assert_eq!(unique.len(), 7);
    }

    async fn seed_history(
        store: &InMemoryDocumentStore,
    ) -> (Actor, ClientId, AccountId, Vec<PointsTransaction>) {
        let now = Utc::now();
        let client_id = ClientId::new();
        let account_id = AccountId::new();
        let actor = Actor::new(client_id, "holder@example.com");

        let client = Client::register("Holder", None, None, now).unwrap();
        let account = loyalty_ledger::LoyaltyAccount::open("main", now).unwrap();

        let mut writes = vec![
            WriteOp::put(paths::client(client_id), &client).unwrap(),
            WriteOp::put(paths::account(client_id, account_id), &account).unwrap(),
        ];

        let mut transactions = Vec::new();
        for i in 0..6 {
            let transaction_type = if i % 2 == 0 {
                TransactionType::Credit
            } else {
                TransactionType::Debit
            };
            let transaction = PointsTransaction::record(
                transaction_type,
                100 + i,
                format!("movement {i}"),
                None,
                now + Duration::minutes(i),
            )
            .unwrap();
            writes.push(
                WriteOp::put(
                    paths::transaction(client_id, account_id, transaction.id),
                    &transaction,
                )
                .unwrap(),
            );
            transactions.push(transaction);
        }

        store.commit(vec![], writes).await.unwrap();
        (actor, client_id, account_id, transactions)
    }

    #[tokio::test]
    async fn transaction_history_filters_by_type_and_date() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let (actor, client_id, account_id, transactions) = seed_history(&store).await;
        let queries = LedgerQueries::new(Arc::clone(&store));

        let page = queries
            .transactions(
                &actor,
                client_id,
                account_id,
                TransactionFilter::default(),
                PageRequest::new(None, None).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 6);
        // Newest first.
        assert_eq!(page.items[0].id, transactions[5].id);
        assert!(page.next_cursor.is_none());

        let credits = queries
            .transactions(
                &actor,
                client_id,
                account_id,
                TransactionFilter {
                    transaction_type: Some(TransactionType::Credit),
                    ..TransactionFilter::default()
                },
                PageRequest::new(None, None).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(credits.items.len(), 3);

        // Inclusive date bounds keep the edge rows.
        let window = queries
            .transactions(
                &actor,
                client_id,
                account_id,
                TransactionFilter {
                    start_date: Some(transactions[1].timestamp),
                    end_date: Some(transactions[4].timestamp),
                    ..TransactionFilter::default()
                },
                PageRequest::new(None, None).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(window.items.len(), 4);
    }

    #[tokio::test]
    async fn transaction_history_requires_visibility() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let (_, client_id, account_id, _) = seed_history(&store).await;
        let queries = LedgerQueries::new(Arc::clone(&store));

        let stranger = Actor::new(ClientId::new(), "stranger@example.com");
        let err = queries
            .transactions(
                &stranger,
                client_id,
                account_id,
                TransactionFilter::default(),
                PageRequest::new(None, None).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Forbidden)));
    }

    #[tokio::test]
    async fn audit_trail_is_scoped_and_filterable() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let now = Utc::now();

        let ana = Actor::new(ClientId::new(), "ana@example.com");
        let ben = Actor::new(ClientId::new(), "ben@example.com");

        // Ana registered herself; Ben credited Ana's account as a circle
        // member; Ben also registered himself.
        let records = vec![
            AuditRecord::client_registered(
                ana.clone(),
                ana.uid,
                loyalty_clients::ProfileSnapshot::default(),
                now,
            ),
            AuditRecord::balance_changed(
                AuditAction::PointsCredited,
                ben.clone(),
                ana.uid,
                AccountId::new(),
                TransactionId::new(),
                0,
                100,
                "gift".to_string(),
                now + Duration::seconds(1),
            ),
            AuditRecord::client_registered(
                ben.clone(),
                ben.uid,
                loyalty_clients::ProfileSnapshot::default(),
                now + Duration::seconds(2),
            ),
        ];
        let writes = records
            .iter()
            .map(|r| WriteOp::put(paths::audit_record(r.id), r).unwrap())
            .collect();
        store.commit(vec![], writes).await.unwrap();

        let queries = LedgerQueries::new(Arc::clone(&store));

        // Ana sees her registration and the credit on her account, not
        // Ben's registration.
        let page = queries
            .audit_records(
                &ana,
                AuditFilter::default(),
                PageRequest::new(None, None).unwrap(),
            )
            .await
            .unwrap();
        let ids: Vec<AuditRecordId> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![records[1].id, records[0].id]);

        // Ben sees everything he performed.
        let page = queries
            .audit_records(
                &ben,
                AuditFilter::default(),
                PageRequest::new(None, None).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);

        let page = queries
            .audit_records(
                &ana,
                AuditFilter {
                    action: Some(AuditAction::PointsCredited),
                    ..AuditFilter::default()
                },
                PageRequest::new(None, None).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, records[1].id);

        // Filtering by Ben as client also matches records he performed.
        let page = queries
            .audit_records(
                &ben,
                AuditFilter {
                    client_id: Some(ben.uid),
                    ..AuditFilter::default()
                },
                PageRequest::new(None, None).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
    }
}

//! Transactional units over the document store.
//!
//! A unit runs as: read everything it depends on, decide, stage writes,
//! commit. Every read pins the observed version (or absence) of its
//! document; `commit` re-checks the whole pinned set under one critical
//! section, so the unit only lands if nothing it read has moved since.
//!
//! ```text
//! run_transaction(store, body)
//!   ↓
//! 1. body reads via TransactionContext (versions pinned)
//!   ↓
//! 2. body decides and stages writes (nothing durable yet)
//!   ↓
//! 3. commit(pinned reads, staged writes) — all writes or none
//!   ↓
//! 4. on conflict: retry the whole body, bounded, with backoff
//! ```
//!
//! Deterministic failures from the body (validation, authorization,
//! insufficient balance) abort the unit immediately and are never retried;
//! only commit-time write conflicts are.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::r#trait::{
    DocPath, DocumentStore, Precondition, StoreError, StoredDocument, WriteOp,
};

const MAX_ATTEMPTS: u32 = 5;
const BASE_BACKOFF: Duration = Duration::from_millis(10);

/// Read set and staged writes of one atomic unit.
///
/// Reads must precede writes: once the first write is staged, further reads
/// are rejected. This keeps the precondition set an honest description of
/// everything the unit's decisions were based on.
pub struct TransactionContext<'a, S: ?Sized> {
    store: &'a S,
    reads: Vec<(DocPath, Precondition)>,
    writes: Vec<WriteOp>,
}

impl<'a, S> TransactionContext<'a, S>
where
    S: DocumentStore + ?Sized,
{
    fn new(store: &'a S) -> Self {
        Self {
            store,
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Read one document, pinning what was observed into the unit's
    /// precondition set.
    pub async fn get(&mut self, path: &DocPath) -> Result<Option<StoredDocument>, StoreError> {
        if !self.writes.is_empty() {
            return Err(StoreError::InvalidTransaction(format!(
                "read of {path} after the first staged write"
            )));
        }

        let doc = self.store.get(path).await?;
        let precondition = match &doc {
            Some(found) => Precondition::Version(found.version),
            None => Precondition::Missing,
        };
        self.reads.push((path.clone(), precondition));
        Ok(doc)
    }

    /// Read and decode one document.
    pub async fn get_typed<T: DeserializeOwned>(
        &mut self,
        path: &DocPath,
    ) -> Result<Option<T>, StoreError> {
        match self.get(path).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Stage an upsert. Nothing is durable until the unit commits.
    pub fn put<T: Serialize>(&mut self, path: DocPath, value: &T) -> Result<(), StoreError> {
        self.writes.push(WriteOp::put(path, value)?);
        Ok(())
    }

    fn into_commit(self) -> (Vec<(DocPath, Precondition)>, Vec<WriteOp>) {
        (self.reads, self.writes)
    }
}

/// Future returned by one attempt of a transaction body.
///
/// Boxed (mirroring the `async_trait` style of [`DocumentStore`]) so the
/// body's future has a nameable, `Send` type; callers' futures then stay
/// `Send`-provable, which the HTTP layer requires of its handlers.
pub type TxnFuture<'c, T> = Pin<Box<dyn Future<Output = T> + Send + 'c>>;

/// Run `body` as one atomic unit with optimistic retry.
///
/// On a commit conflict the whole body is re-run against a fresh read
/// snapshot, up to 5 attempts with exponential backoff from a 10ms base;
/// exhaustion surfaces the final conflict. Any other error aborts
/// immediately.
pub async fn run_transaction<S, T, E, F>(store: &S, mut body: F) -> Result<T, E>
where
    S: DocumentStore + ?Sized,
    E: From<StoreError>,
    F: for<'c> FnMut(&'c mut TransactionContext<'_, S>) -> TxnFuture<'c, Result<T, E>>,
{
    let mut backoff = BASE_BACKOFF;
    let mut attempt = 1;

    loop {
        let mut txn = TransactionContext::new(store);
        let value = body(&mut txn).await?;
        let (preconditions, writes) = txn.into_commit();

        match store.commit(preconditions, writes).await {
            Ok(()) => return Ok(value),
            Err(StoreError::Conflict(_)) if attempt < MAX_ATTEMPTS => {
                tracing::debug!(attempt, "commit conflict, retrying unit");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            Err(err) => return Err(E::from(err)),
        }
    }
}

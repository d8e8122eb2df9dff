use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Location of a single document: a collection path plus a document id.
///
/// Collections nest by path segment (`clients/{id}/accounts`), the way the
/// constructors in [`crate::paths`] build them. Two paths are the same
/// document iff both components match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocPath {
    collection: String,
    doc_id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, doc_id: impl fmt::Display) -> Self {
        Self {
            collection: collection.into(),
            doc_id: doc_id.to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.doc_id)
    }
}

/// A document plus the version the store assigned at its last write.
///
/// Versions start at 1 on first write and increase by one per rewrite. They
/// exist only to drive the optimistic [`Precondition`]s checked by
/// [`DocumentStore::commit`]; nothing else may interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub path: DocPath,
    pub version: u64,
    pub data: JsonValue,
}

impl StoredDocument {
    /// Decode the payload into a typed document.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", self.path)))
    }
}

/// Per-document optimistic check evaluated under the commit lock.
///
/// Captured at read time: a read that found the document pins its version,
/// a read that found nothing pins its absence. A precondition that no longer
/// holds at commit means another writer got there first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The document must not exist.
    Missing,
    /// The document must exist at exactly this version.
    Version(u64),
}

impl Precondition {
    pub fn matches(&self, current: Option<u64>) -> bool {
        match (self, current) {
            (Precondition::Missing, None) => true,
            (Precondition::Version(expected), Some(found)) => *expected == found,
            _ => false,
        }
    }
}

/// A single staged upsert applied by [`DocumentStore::commit`].
///
/// Whether the write is a create or an update is not encoded here; the
/// preconditions captured by the reads of the same unit carry that intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOp {
    pub path: DocPath,
    pub data: JsonValue,
}

impl WriteOp {
    /// Serialize a typed document into a staged write.
    pub fn put<T: Serialize>(path: DocPath, value: &T) -> Result<Self, StoreError> {
        let data = serde_json::to_value(value)
            .map_err(|e| StoreError::Serialization(format!("{path}: {e}")))?;
        Ok(Self { path, data })
    }
}

/// Document store operation error.
///
/// These are **infrastructure errors** (storage, concurrency, codec) as
/// opposed to domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A commit precondition no longer held.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// A transactional unit was driven out of order (e.g. a read after the
    /// first staged write).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("storage failed: {0}")]
    Storage(String),
}

/// Versioned, transactional document store.
///
/// The `DocumentStore` is the persistence boundary for every durable record
/// in the platform: client documents, accounts, transactions, audit records,
/// circle configs, groups. It makes no storage assumptions; the in-memory
/// implementation serves tests and dev, and any transactional KV/document
/// backend can satisfy the trait.
///
/// ## Commit Semantics
///
/// `commit()` is the only mutating entry point and is atomic:
///
/// - every precondition is checked against the live version under one
///   critical section;
/// - if any check fails, **nothing** is written and the call returns
///   [`StoreError::Conflict`];
/// - otherwise all writes land, each bumping (or initializing) its
///   document's version.
///
/// Because preconditions cover the full read set of a unit (see
/// [`super::txn::TransactionContext`]), a successful commit proves that no
/// document the unit based its decisions on changed in the meantime. That is
/// what lets a balance check, its transaction record, and its audit record
/// move as one unit.
///
/// ## Read Semantics
///
/// `get()` returns the current version of one document; `list()` scans a
/// collection with no ordering guarantee. Readers that need a consistent
/// multi-document view go through a transactional unit instead.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, or `None` if it does not exist.
    async fn get(&self, path: &DocPath) -> Result<Option<StoredDocument>, StoreError>;

    /// All documents currently in `collection`, in no particular order.
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError>;

    /// Atomically apply `writes` iff every precondition still holds.
    async fn commit(
        &self,
        preconditions: Vec<(DocPath, Precondition)>,
        writes: Vec<WriteOp>,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn get(&self, path: &DocPath) -> Result<Option<StoredDocument>, StoreError> {
        (**self).get(path).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        (**self).list(collection).await
    }

    async fn commit(
        &self,
        preconditions: Vec<(DocPath, Precondition)>,
        writes: Vec<WriteOp>,
    ) -> Result<(), StoreError> {
        (**self).commit(preconditions, writes).await
    }
}

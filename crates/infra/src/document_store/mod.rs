//! Transactional document store boundary.
//!
//! This module defines the infrastructure-facing abstraction for versioned
//! document persistence with atomic multi-document commits, without making
//! any storage assumptions.

pub mod in_memory;
pub mod r#trait;
pub mod txn;

pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{DocPath, DocumentStore, Precondition, StoreError, StoredDocument, WriteOp};
pub use txn::{TransactionContext, TxnFuture, run_transaction};

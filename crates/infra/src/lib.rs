//! Infrastructure layer: document persistence, atomic ledger execution,
//! directory services, and read-side queries.

pub mod document_store;
pub mod error;
pub mod paths;
pub mod executor;
pub mod directory;
pub mod query;

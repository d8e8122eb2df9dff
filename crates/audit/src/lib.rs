//! Audit domain module.
//!
//! Every mutation on the platform writes exactly one immutable audit record
//! inside the mutation's own atomic unit. This crate defines the record
//! model and one constructor per mutation path, so the shape of the
//! before/after snapshots is enforced at compile time.

pub mod action;
pub mod record;
pub mod snapshot;

pub use action::{AuditAction, ResourceType};
pub use record::{AuditMetadata, AuditRecord};
pub use snapshot::{
    AccountSnapshot, AuditChanges, BalanceSnapshot, ConfigSnapshot, GroupIdsSnapshot,
    GroupSnapshot,
};

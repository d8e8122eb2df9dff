//! Family-circle domain module (delegated account access).
//!
//! A circle has exactly one holder and any number of members. Members may be
//! granted per-account credit/debit rights by the holder. Everything in this
//! crate is deterministic domain logic (no IO, no HTTP, no storage).

pub mod config;
pub mod membership;
pub mod policy;

pub use config::{CircleConfig, CircleConfigPatch};
pub use membership::{CircleMember, CircleRole, RelationshipType, add_member, remove_member};
pub use policy::{LedgerOperation, OriginatedBy, authorize_operation};

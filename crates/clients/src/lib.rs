//! Clients domain module.
//!
//! The client document is the anchor of the data model: it owns the loyalty
//! accounts, carries the denormalized balance map, group memberships and the
//! family-circle role. Pure domain logic only (no IO, no HTTP, no storage).

pub mod client;
pub mod group;

pub use client::{Client, ClientPatch, ProfileDiff, ProfileSnapshot};
pub use group::AffinityGroup;

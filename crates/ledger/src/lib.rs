//! Ledger domain module (loyalty accounts and point transactions).
//!
//! Business rules for balances, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage). The atomic persistence of a balance
//! change together with its transaction and audit record is the
//! infrastructure layer's job.

pub mod account;
pub mod transaction;

pub use account::{LoyaltyAccount, validate_amount};
pub use transaction::{PointsTransaction, TransactionType};

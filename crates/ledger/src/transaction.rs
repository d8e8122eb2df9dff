use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loyalty_circle::{LedgerOperation, OriginatedBy};
use loyalty_core::{DomainResult, TransactionId};

use crate::account::validate_amount;

/// Direction of a point movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    /// The delegation-policy operation this movement corresponds to.
    pub fn as_operation(self) -> LedgerOperation {
        match self {
            TransactionType::Credit => LedgerOperation::Credit,
            TransactionType::Debit => LedgerOperation::Debit,
        }
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransactionType::Credit => f.write_str("credit"),
            TransactionType::Debit => f.write_str("debit"),
        }
    }
}

/// An immutable point movement on one account.
///
/// `originated_by` is set only when a delegated circle member executed the
/// movement; the holder's own movements carry no provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsTransaction {
    pub id: TransactionId,
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originated_by: Option<OriginatedBy>,
}

impl PointsTransaction {
    /// Validate and build a movement record. Ids are UUIDv7, so records sort
    /// by id in creation order within equal timestamps.
    pub fn record(
        transaction_type: TransactionType,
        amount: i64,
        description: String,
        originated_by: Option<OriginatedBy>,
        timestamp: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_amount(amount)?;

        Ok(Self {
            id: TransactionId::new(),
            transaction_type,
            amount,
            description,
            timestamp,
            originated_by,
        })
    }
}

use thiserror::Error;

use loyalty_core::DomainError;

use crate::document_store::StoreError;

/// Failure of an application-level operation: a domain rejection or an
/// infrastructure fault.
///
/// Domain rejections keep their identity so the API layer can map each to
/// its wire code. Store faults stay separate, except commit conflicts:
/// retry exhaustion is reported to callers as a domain conflict, since that
/// is the contract of every write path.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            other => ServiceError::Store(other),
        }
    }
}

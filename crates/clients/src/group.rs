use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loyalty_core::{DomainError, DomainResult};

/// An affinity group document.
///
/// Groups are top-level; clients point at them through
/// `affinity_group_ids`, so membership changes touch the client document
/// only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityGroup {
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AffinityGroup {
    pub fn create(
        name: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            name,
            description: description.into(),
            created_at: now,
            updated_at: now,
        })
    }
}

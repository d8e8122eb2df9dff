use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loyalty_circle::CircleRole;
use loyalty_core::{AccountId, DomainError, DomainResult, GroupId};

/// A client document.
///
/// The document id is the owning principal's uid and lives on the store
/// path, not in the data. `account_balances` is a denormalized cache kept
/// consistent by the ledger executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    pub email: Option<String>,
    pub identity_document: Option<String>,
    #[serde(default)]
    pub account_balances: BTreeMap<AccountId, i64>,
    #[serde(default)]
    pub affinity_group_ids: BTreeSet<GroupId>,
    #[serde(default)]
    pub family_circle: Option<CircleRole>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Validate and build a fresh client document.
    pub fn register(
        name: impl Into<String>,
        email: Option<String>,
        identity_document: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        if let Some(email) = &email {
            validate_email(email)?;
        }

        Ok(Self {
            name,
            email,
            identity_document,
            account_balances: BTreeMap::new(),
            affinity_group_ids: BTreeSet::new(),
            family_circle: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a profile patch; absent fields keep their current value.
    ///
    /// Returns the updated document and the audit diff restricted to the
    /// fields that actually changed, or `None` when the patch is a no-op.
    pub fn apply_patch(
        mut self,
        patch: ClientPatch,
        now: DateTime<Utc>,
    ) -> DomainResult<(Self, Option<ProfileDiff>)> {
        let mut before = ProfileSnapshot::default();
        let mut after = ProfileSnapshot::default();

        if let Some(name) = patch.name {
            validate_name(&name)?;
            if name != self.name {
                before.name = Some(self.name.clone());
                after.name = Some(name.clone());
                self.name = name;
            }
        }

        if let Some(email) = patch.email {
            validate_email(&email)?;
            if self.email.as_deref() != Some(email.as_str()) {
                before.email = self.email.clone();
                after.email = Some(email.clone());
                self.email = Some(email);
            }
        }

        if let Some(identity_document) = patch.identity_document {
            if self.identity_document.as_deref() != Some(identity_document.as_str()) {
                before.identity_document = self.identity_document.clone();
                after.identity_document = Some(identity_document.clone());
                self.identity_document = Some(identity_document);
            }
        }

        if after.is_empty() {
            return Ok((self, None));
        }

        self.updated_at = now;
        Ok((self, Some(ProfileDiff { before, after })))
    }

    /// Join an affinity group. Returns the (before, after) id sets when the
    /// membership actually changed; `None` makes the operation idempotent.
    pub fn join_group(
        &mut self,
        group_id: GroupId,
        now: DateTime<Utc>,
    ) -> Option<(BTreeSet<GroupId>, BTreeSet<GroupId>)> {
        if self.affinity_group_ids.contains(&group_id) {
            return None;
        }
        let before = self.affinity_group_ids.clone();
        self.affinity_group_ids.insert(group_id);
        self.updated_at = now;
        Some((before, self.affinity_group_ids.clone()))
    }

    /// Leave an affinity group; same contract as [`Client::join_group`].
    pub fn leave_group(
        &mut self,
        group_id: GroupId,
        now: DateTime<Utc>,
    ) -> Option<(BTreeSet<GroupId>, BTreeSet<GroupId>)> {
        if !self.affinity_group_ids.contains(&group_id) {
            return None;
        }
        let before = self.affinity_group_ids.clone();
        self.affinity_group_ids.remove(&group_id);
        self.updated_at = now;
        Some((before, self.affinity_group_ids.clone()))
    }

    /// The full profile as a snapshot (all fields present).
    pub fn profile(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            name: Some(self.name.clone()),
            email: self.email.clone(),
            identity_document: self.identity_document.clone(),
        }
    }

    /// Mirror an account balance onto the owning client document.
    pub fn note_balance(&mut self, account_id: AccountId, points: i64, now: DateTime<Utc>) {
        self.account_balances.insert(account_id, points);
        self.updated_at = now;
    }
}

/// Profile patch as sent by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub identity_document: Option<String>,
}

/// Top-level profile fields, restricted to what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_document: Option<String>,
}

impl ProfileSnapshot {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.identity_document.is_none()
    }
}

/// Before/after snapshots of the changed profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDiff {
    pub before: ProfileSnapshot,
    pub after: ProfileSnapshot,
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    if !email.contains('@') {
        return Err(DomainError::validation("email is not a valid address"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered() -> Client {
        Client::register(
            "Ana Silva",
            Some("ana@example.com".to_string()),
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn register_starts_with_empty_balances_and_no_circle() {
        let client = registered();
        assert!(client.account_balances.is_empty());
        assert!(client.affinity_group_ids.is_empty());
        assert_eq!(client.family_circle, None);
    }

    #[test]
    fn register_rejects_blank_name() {
        let err = Client::register("   ", None, None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn register_rejects_malformed_email() {
        let err =
            Client::register("Ana", Some("not-an-address".to_string()), None, Utc::now())
                .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn patch_diff_is_restricted_to_changed_fields() {
        let client = registered();
        let patch = ClientPatch {
            name: Some("Ana Souza".to_string()),
            // Same value as stored: must not appear in the diff.
            email: Some("ana@example.com".to_string()),
            identity_document: None,
        };

        let (updated, diff) = client.apply_patch(patch, Utc::now()).unwrap();
        let diff = diff.expect("name changed");

        assert_eq!(updated.name, "Ana Souza");
        assert_eq!(diff.before.name.as_deref(), Some("Ana Silva"));
        assert_eq!(diff.after.name.as_deref(), Some("Ana Souza"));
        assert_eq!(diff.before.email, None);
        assert_eq!(diff.after.email, None);
    }

    #[test]
    fn noop_patch_produces_no_diff_and_keeps_updated_at() {
        let client = registered();
        let updated_at = client.updated_at;
        let patch = ClientPatch {
            name: Some(client.name.clone()),
            email: None,
            identity_document: None,
        };

        let (updated, diff) = client.apply_patch(patch, Utc::now()).unwrap();
        assert_eq!(diff, None);
        assert_eq!(updated.updated_at, updated_at);
    }

    #[test]
    fn join_and_leave_group_report_membership_set_changes() {
        let mut client = registered();
        let group = GroupId::new();

        let (before, after) = client.join_group(group, Utc::now()).expect("joined");
        assert!(before.is_empty());
        assert!(after.contains(&group));

        // Joining again is a no-op.
        assert_eq!(client.join_group(group, Utc::now()), None);

        let (before, after) = client.leave_group(group, Utc::now()).expect("left");
        assert!(before.contains(&group));
        assert!(after.is_empty());

        // Leaving a group the client is not in is a no-op.
        assert_eq!(client.leave_group(group, Utc::now()), None);
    }

    #[test]
    fn patch_recording_a_first_identity_document_has_absent_before() {
        let client = registered();
        let patch = ClientPatch {
            name: None,
            email: None,
            identity_document: Some("12345678-9".to_string()),
        };

        let (_, diff) = client.apply_patch(patch, Utc::now()).unwrap();
        let diff = diff.unwrap();
        assert_eq!(diff.before.identity_document, None);
        assert_eq!(diff.after.identity_document.as_deref(), Some("12345678-9"));
    }
}

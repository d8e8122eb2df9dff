use serde::{Deserialize, Serialize};

use loyalty_core::{ClientId, DomainError, DomainResult};

use crate::config::CircleConfig;
use crate::membership::{CircleRole, RelationshipType};

/// Ledger operation kinds gated by the per-account config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerOperation {
    Credit,
    Debit,
}

impl core::fmt::Display for LedgerOperation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LedgerOperation::Credit => f.write_str("credit"),
            LedgerOperation::Debit => f.write_str("debit"),
        }
    }
}

/// Provenance stamped onto transactions executed by a delegated member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginatedBy {
    pub client_id: ClientId,
    pub is_circle_member: bool,
    pub relationship_type: RelationshipType,
}

/// Decide whether `actor_id` may run `operation` on an account owned by
/// `holder_id`.
///
/// - No IO
/// - No panics
/// - No business logic beyond the delegation policy
///
/// `actor_role` is the circle role on the *actor's* client document;
/// `config` is the target account's config document (if any). Resolution
/// order: the holder is always allowed (no provenance); a non-member is
/// `Forbidden`; a member without the operation's switch is
/// `PermissionDenied`; a member with it is allowed and tagged with an
/// [`OriginatedBy`] descriptor.
pub fn authorize_operation(
    actor_id: ClientId,
    holder_id: ClientId,
    actor_role: Option<&CircleRole>,
    config: Option<&CircleConfig>,
    operation: LedgerOperation,
) -> DomainResult<Option<OriginatedBy>> {
    if actor_id == holder_id {
        return Ok(None);
    }

    let Some(CircleRole::Member {
        holder_id: member_of,
        relationship_type,
        ..
    }) = actor_role
    else {
        return Err(DomainError::Forbidden);
    };

    if *member_of != holder_id {
        return Err(DomainError::Forbidden);
    }

    let allowed = config.is_some_and(|c| match operation {
        LedgerOperation::Credit => c.allow_member_credits,
        LedgerOperation::Debit => c.allow_member_debits,
    });

    if !allowed {
        return Err(DomainError::permission_denied(format!(
            "family circle members may not {operation} on this account"
        )));
    }

    Ok(Some(OriginatedBy {
        client_id: actor_id,
        is_circle_member: true,
        relationship_type: relationship_type.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn member_role(holder: ClientId) -> CircleRole {
        CircleRole::Member {
            holder_id: holder,
            relationship_type: RelationshipType::new("spouse"),
            joined_at: Utc::now(),
        }
    }

    fn config(credits: bool, debits: bool, holder: ClientId) -> CircleConfig {
        CircleConfig {
            allow_member_credits: credits,
            allow_member_debits: debits,
            updated_at: Utc::now(),
            updated_by: holder,
        }
    }

    #[test]
    fn holder_is_always_allowed_without_provenance() {
        let holder = ClientId::new();
        let granted =
            authorize_operation(holder, holder, None, None, LedgerOperation::Debit).unwrap();
        assert_eq!(granted, None);
    }

    #[test]
    fn stranger_is_forbidden_even_with_permissive_config() {
        let holder = ClientId::new();
        let stranger = ClientId::new();
        let cfg = config(true, true, holder);

        let err = authorize_operation(
            stranger,
            holder,
            None,
            Some(&cfg),
            LedgerOperation::Credit,
        )
        .unwrap_err();
        assert_eq!(err, DomainError::Forbidden);
    }

    #[test]
    fn member_of_a_different_circle_is_forbidden() {
        let holder = ClientId::new();
        let other_holder = ClientId::new();
        let actor = ClientId::new();
        let role = member_role(other_holder);
        let cfg = config(true, true, holder);

        let err = authorize_operation(
            actor,
            holder,
            Some(&role),
            Some(&cfg),
            LedgerOperation::Credit,
        )
        .unwrap_err();
        assert_eq!(err, DomainError::Forbidden);
    }

    #[test]
    fn member_without_the_switch_is_permission_denied() {
        let holder = ClientId::new();
        let actor = ClientId::new();
        let role = member_role(holder);
        let cfg = config(true, false, holder);

        let err = authorize_operation(
            actor,
            holder,
            Some(&role),
            Some(&cfg),
            LedgerOperation::Debit,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[test]
    fn missing_config_denies_members() {
        let holder = ClientId::new();
        let actor = ClientId::new();
        let role = member_role(holder);

        let err =
            authorize_operation(actor, holder, Some(&role), None, LedgerOperation::Credit)
                .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[test]
    fn member_with_the_switch_gets_tagged_provenance() {
        let holder = ClientId::new();
        let actor = ClientId::new();
        let role = member_role(holder);
        let cfg = config(false, true, holder);

        let granted = authorize_operation(
            actor,
            holder,
            Some(&role),
            Some(&cfg),
            LedgerOperation::Debit,
        )
        .unwrap()
        .expect("member provenance");

        assert_eq!(granted.client_id, actor);
        assert!(granted.is_circle_member);
        assert_eq!(granted.relationship_type.as_str(), "spouse");
    }
}

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loyalty_core::{ClientId, DomainError, DomainResult};

/// Relationship of a circle member to the holder.
///
/// Relationships are intentionally opaque strings at this layer ("spouse",
/// "child", ...); the platform does not enumerate allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipType(Cow<'static, str>);

impl RelationshipType {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A member entry on the holder's side of the circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircleMember {
    pub client_id: ClientId,
    pub relationship_type: RelationshipType,
    pub joined_at: DateTime<Utc>,
}

/// A client's position in a family circle.
///
/// Invariants: exactly one holder per circle; a client is never holder and
/// member at once, and never a member of two circles. [`add_member`] and
/// [`remove_member`] are the only transitions and uphold both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum CircleRole {
    Holder {
        members: Vec<CircleMember>,
    },
    Member {
        holder_id: ClientId,
        relationship_type: RelationshipType,
        joined_at: DateTime<Utc>,
    },
}

impl CircleRole {
    /// Whether this role is a membership in `holder`'s circle.
    pub fn is_member_of(&self, holder: ClientId) -> bool {
        matches!(self, CircleRole::Member { holder_id, .. } if *holder_id == holder)
    }

    /// Member entries when this role is the holder side, empty otherwise.
    pub fn members(&self) -> &[CircleMember] {
        match self {
            CircleRole::Holder { members } => members,
            CircleRole::Member { .. } => &[],
        }
    }
}

/// Attach `member_id` to `holder_id`'s circle.
///
/// Takes both clients' current roles and returns the updated pair
/// `(holder_role, member_role)`; the caller persists both documents in one
/// atomic unit so the two sides can never diverge.
pub fn add_member(
    holder_id: ClientId,
    member_id: ClientId,
    relationship_type: RelationshipType,
    joined_at: DateTime<Utc>,
    holder_role: Option<CircleRole>,
    member_role: Option<CircleRole>,
) -> DomainResult<(CircleRole, CircleRole)> {
    if member_id == holder_id {
        return Err(DomainError::CannotAddSelf);
    }

    // The prospective member must be circle-less on their own document.
    if member_role.is_some() {
        return Err(DomainError::MemberAlreadyInCircle);
    }

    let mut members = match holder_role {
        None => Vec::new(),
        Some(CircleRole::Holder { members }) => members,
        // A member of another circle cannot simultaneously hold one.
        Some(CircleRole::Member { .. }) => return Err(DomainError::MemberAlreadyInCircle),
    };

    if members.iter().any(|m| m.client_id == member_id) {
        return Err(DomainError::MemberAlreadyInCircle);
    }

    members.push(CircleMember {
        client_id: member_id,
        relationship_type: relationship_type.clone(),
        joined_at,
    });

    Ok((
        CircleRole::Holder { members },
        CircleRole::Member {
            holder_id,
            relationship_type,
            joined_at,
        },
    ))
}

/// Detach `member_id` from `holder_id`'s circle.
///
/// Returns the updated pair `(holder_role, member_role)`: the holder keeps
/// its (possibly now empty) circle, the member becomes circle-less.
pub fn remove_member(
    holder_id: ClientId,
    member_id: ClientId,
    holder_role: Option<CircleRole>,
) -> DomainResult<(CircleRole, Option<CircleRole>)> {
    let Some(CircleRole::Holder { mut members }) = holder_role else {
        return Err(DomainError::not_found(format!(
            "client {holder_id} has no family circle"
        )));
    };

    let before = members.len();
    members.retain(|m| m.client_id != member_id);
    if members.len() == before {
        return Err(DomainError::not_found(format!(
            "client {member_id} is not a member of this family circle"
        )));
    }

    Ok((CircleRole::Holder { members }, None))
}

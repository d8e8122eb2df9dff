use serde::{Deserialize, Serialize};

use loyalty_core::{DomainError, DomainResult};

/// The mutation kinds recorded in the audit collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    ClientRegistered,
    ClientUpdated,
    AccountCreated,
    PointsCredited,
    PointsDebited,
    GroupCreated,
    GroupMembershipChanged,
    CircleMemberAdded,
    CircleMemberRemoved,
    CircleConfigUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ClientRegistered => "CLIENT_REGISTERED",
            AuditAction::ClientUpdated => "CLIENT_UPDATED",
            AuditAction::AccountCreated => "ACCOUNT_CREATED",
            AuditAction::PointsCredited => "POINTS_CREDITED",
            AuditAction::PointsDebited => "POINTS_DEBITED",
            AuditAction::GroupCreated => "GROUP_CREATED",
            AuditAction::GroupMembershipChanged => "GROUP_MEMBERSHIP_CHANGED",
            AuditAction::CircleMemberAdded => "CIRCLE_MEMBER_ADDED",
            AuditAction::CircleMemberRemoved => "CIRCLE_MEMBER_REMOVED",
            AuditAction::CircleConfigUpdated => "CIRCLE_CONFIG_UPDATED",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AuditAction {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "CLIENT_REGISTERED" => Ok(AuditAction::ClientRegistered),
            "CLIENT_UPDATED" => Ok(AuditAction::ClientUpdated),
            "ACCOUNT_CREATED" => Ok(AuditAction::AccountCreated),
            "POINTS_CREDITED" => Ok(AuditAction::PointsCredited),
            "POINTS_DEBITED" => Ok(AuditAction::PointsDebited),
            "GROUP_CREATED" => Ok(AuditAction::GroupCreated),
            "GROUP_MEMBERSHIP_CHANGED" => Ok(AuditAction::GroupMembershipChanged),
            "CIRCLE_MEMBER_ADDED" => Ok(AuditAction::CircleMemberAdded),
            "CIRCLE_MEMBER_REMOVED" => Ok(AuditAction::CircleMemberRemoved),
            "CIRCLE_CONFIG_UPDATED" => Ok(AuditAction::CircleConfigUpdated),
            other => Err(DomainError::validation(format!(
                "unknown audit action '{other}'"
            ))),
        }
    }
}

/// The entity kinds an audit record can primarily describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Client,
    Account,
    Group,
    FamilyCircle,
    FamilyCircleConfig,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Client => "client",
            ResourceType::Account => "account",
            ResourceType::Group => "group",
            ResourceType::FamilyCircle => "family_circle",
            ResourceType::FamilyCircleConfig => "family_circle_config",
        }
    }
}

impl core::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ResourceType {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "client" => Ok(ResourceType::Client),
            "account" => Ok(ResourceType::Account),
            "group" => Ok(ResourceType::Group),
            "family_circle" => Ok(ResourceType::FamilyCircle),
            "family_circle_config" => Ok(ResourceType::FamilyCircleConfig),
            other => Err(DomainError::validation(format!(
                "unknown resource type '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_round_trips_through_its_wire_name() {
        let parsed: AuditAction = AuditAction::PointsCredited.as_str().parse().unwrap();
        assert_eq!(parsed, AuditAction::PointsCredited);
    }

    #[test]
    fn unknown_action_fails_validation() {
        let err = "POINTS_TELEPORTED".parse::<AuditAction>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn serde_uses_the_screaming_snake_names() {
        let json = serde_json::to_string(&AuditAction::CircleMemberAdded).unwrap();
        assert_eq!(json, "\"CIRCLE_MEMBER_ADDED\"");
    }
}

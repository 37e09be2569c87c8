//! API request/response models for team invitations and seats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::team_members::{TeamMemberCreateDBRequest, TeamMemberDBResponse, TeamMemberStatus, TeamRole};
use crate::types::{TeamMemberId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamInvite {
    #[schema(example = "grace@example.org")]
    pub email: String,
    /// Defaults to `member`
    #[serde(default)]
    pub role: TeamRole,
}

impl TeamInvite {
    pub fn into_db_request(self, owner_id: UserId) -> TeamMemberCreateDBRequest {
        TeamMemberCreateDBRequest {
            owner_id,
            email: self.email,
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamMemberUpdate {
    pub role: TeamRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamMemberResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TeamMemberId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub member_id: Option<UserId>,
    pub email: String,
    pub role: TeamRole,
    pub status: TeamMemberStatus,
    pub invited_at: DateTime<Utc>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl From<TeamMemberDBResponse> for TeamMemberResponse {
    fn from(db: TeamMemberDBResponse) -> Self {
        Self {
            id: db.id,
            member_id: db.member_id,
            email: db.email,
            role: db.role,
            status: db.status,
            invited_at: db.invited_at,
            joined_at: db.joined_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_role_defaults_to_member() {
        let invite: TeamInvite = serde_json::from_str(r#"{"email": "grace@example.org"}"#).unwrap();
        assert_eq!(invite.role, TeamRole::Member);

        let invite: TeamInvite = serde_json::from_str(r#"{"email": "grace@example.org", "role": "viewer"}"#).unwrap();
        assert_eq!(invite.role, TeamRole::Viewer);
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(serde_json::from_str::<TeamMemberUpdate>(r#"{"role": "owner"}"#).is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{TeamMemberId, UserId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum TeamRole {
    Admin,
    #[default]
    Member,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum TeamMemberStatus {
    Pending,
    Active,
}

#[derive(Debug, Clone)]
pub struct TeamMemberCreateDBRequest {
    pub owner_id: UserId,
    pub email: String,
    pub role: TeamRole,
}

#[derive(Debug, Clone, FromRow)]
pub struct TeamMemberDBResponse {
    pub id: TeamMemberId,
    pub owner_id: UserId,
    pub member_id: Option<UserId>,
    pub email: String,
    pub role: TeamRole,
    pub status: TeamMemberStatus,
    pub invited_at: DateTime<Utc>,
    pub joined_at: Option<DateTime<Utc>>,
}

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::UserId;

#[derive(Debug, Clone)]
pub struct ProfileCreateDBRequest {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub organization_name: Option<String>,
}

/// Partial update. The outer `Option` means "leave unchanged", the inner one clears the column.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateDBRequest {
    pub full_name: Option<Option<String>>,
    pub organization_name: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProfileDBResponse {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub organization_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

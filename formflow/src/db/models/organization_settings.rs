use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::UserId;

/// Brand colour used until the organization picks one
pub const DEFAULT_PRIMARY_COLOR: &str = "#4f46e5";

#[derive(Debug, Clone, Default)]
pub struct OrganizationSettingsUpdateDBRequest {
    pub organization_name: Option<Option<String>>,
    pub logo_url: Option<Option<String>>,
    pub primary_color: Option<String>,
    pub contact_email: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub mission_statement: Option<Option<String>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrganizationSettingsDBResponse {
    pub id: Uuid,
    pub user_id: UserId,
    pub organization_name: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub contact_email: Option<String>,
    pub website: Option<String>,
    pub mission_statement: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{LinkId, UserId};

#[derive(Debug, Clone)]
pub struct LinkCreateDBRequest {
    pub user_id: UserId,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub folder: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LinkUpdateDBRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub folder: Option<Option<String>>,
    pub icon: Option<Option<String>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LinkDBResponse {
    pub id: LinkId,
    pub user_id: UserId,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub folder: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use sqlx::{FromRow, types::Json};

use crate::forms::{FormField, FormSettings};
use crate::types::{FormId, UserId};

#[derive(Debug, Clone)]
pub struct FormCreateDBRequest {
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<FormField>,
    pub settings: FormSettings,
}

#[derive(Debug, Clone, Default)]
pub struct FormUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub fields: Option<Vec<FormField>>,
    pub settings: Option<FormSettings>,
    pub is_published: Option<bool>,
    pub is_archived: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
pub struct FormDBResponse {
    pub id: FormId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub fields: Json<Vec<FormField>>,
    pub settings: Json<FormSettings>,
    pub is_published: bool,
    pub is_archived: bool,
    pub response_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormDBResponse {
    /// Open to the public submission endpoints
    pub fn accepts_submissions(&self) -> bool {
        self.is_published && !self.is_archived
    }
}

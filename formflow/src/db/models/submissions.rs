use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{FromRow, types::Json};

use crate::types::{FormId, SubmissionId};

#[derive(Debug, Clone)]
pub struct SubmissionCreateDBRequest {
    pub form_id: FormId,
    pub data: Map<String, Value>,
    pub respondent_email: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SubmissionDBResponse {
    pub id: SubmissionId,
    pub form_id: FormId,
    pub data: Json<Map<String, Value>>,
    pub respondent_email: Option<String>,
    pub ip_address: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Submission count for one form, for the reports overview
#[derive(Debug, Clone, FromRow)]
pub struct FormSubmissionCount {
    pub form_id: FormId,
    pub title: String,
    pub submissions: i64,
}

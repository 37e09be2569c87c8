//! API request/response models for form submissions and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::db::models::submissions::{FormSubmissionCount, SubmissionDBResponse};
use crate::reports::{FieldReport, overview_label};
use crate::types::{FormId, SubmissionId};

/// Body of a public submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionCreate {
    /// Answers keyed by field id
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
    pub respondent_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SubmissionId,
    #[schema(value_type = String, format = "uuid")]
    pub form_id: FormId,
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
    pub respondent_email: Option<String>,
    pub ip_address: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl From<SubmissionDBResponse> for SubmissionResponse {
    fn from(db: SubmissionDBResponse) -> Self {
        Self {
            id: db.id,
            form_id: db.form_id,
            data: db.data.0,
            respondent_email: db.respondent_email,
            ip_address: db.ip_address,
            submitted_at: db.submitted_at,
        }
    }
}

/// Returned to the respondent after a successful submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionAccepted {
    #[schema(value_type = String, format = "uuid")]
    pub id: SubmissionId,
    /// The form's configured success message, if any
    pub message: String,
}

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Thank you for your submission!";

/// `GET /api/v1/forms/{id}/report`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormReportResponse {
    #[schema(value_type = String, format = "uuid")]
    pub form_id: FormId,
    pub title: String,
    pub total_submissions: usize,
    pub fields: Vec<FieldReport>,
}

/// One bar of the submissions overview chart
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OverviewEntry {
    #[schema(value_type = String, format = "uuid")]
    pub form_id: FormId,
    /// Title shortened for display
    pub name: String,
    pub submissions: i64,
}

impl From<FormSubmissionCount> for OverviewEntry {
    fn from(count: FormSubmissionCount) -> Self {
        Self {
            form_id: count.form_id,
            name: overview_label(&count.title),
            submissions: count.submissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_overview_entry_shortens_title() {
        let entry = OverviewEntry::from(FormSubmissionCount {
            form_id: Uuid::new_v4(),
            title: "Annual volunteer satisfaction survey".to_string(),
            submissions: 7,
        });
        assert_eq!(entry.name, "Annual voluntee...");
        assert_eq!(entry.submissions, 7);
    }

    #[test]
    fn test_submission_body_requires_data() {
        assert!(serde_json::from_str::<SubmissionCreate>(r#"{"respondent_email": "a@b.co"}"#).is_err());
        let body: SubmissionCreate = serde_json::from_str(r#"{"data": {"q1": "yes"}}"#).unwrap();
        assert!(body.respondent_email.is_none());
    }
}

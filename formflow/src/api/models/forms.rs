//! API request/response models for forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, rust::double_option, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use crate::db::models::forms::{FormCreateDBRequest, FormDBResponse, FormUpdateDBRequest};
use crate::forms::{FormField, FormSettings};
use crate::types::{FormId, UserId};

/// Query parameters for listing forms
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListFormsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Include archived forms (default: false)
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub include_archived: Option<bool>,
}

impl ListFormsQuery {
    pub fn include_archived(&self) -> bool {
        self.include_archived.unwrap_or(false)
    }
}

/// Request body for creating a form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormCreate {
    #[schema(example = "Volunteer sign-up")]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default)]
    pub settings: FormSettings,
}

impl FormCreate {
    pub fn into_db_request(self, user_id: UserId) -> FormCreateDBRequest {
        FormCreateDBRequest {
            user_id,
            title: self.title.trim().to_string(),
            description: super::users::trimmed(self.description),
            fields: self.fields,
            settings: self.settings,
        }
    }
}

/// Partial form update. Publishing and archiving have their own endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FormUpdate {
    pub title: Option<String>,
    /// `null` clears the description
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub fields: Option<Vec<FormField>>,
    pub settings: Option<FormSettings>,
}

impl From<FormUpdate> for FormUpdateDBRequest {
    fn from(update: FormUpdate) -> Self {
        Self {
            title: update.title.map(|t| t.trim().to_string()),
            description: update.description.map(super::users::trimmed),
            fields: update.fields,
            settings: update.settings,
            is_published: None,
            is_archived: None,
        }
    }
}

/// Query parameters for the publish and archive toggles
#[derive(Debug, Deserialize, IntoParams)]
pub struct ToggleQuery {
    /// `false` reverses the action (unpublish / unarchive)
    #[serde(default = "default_true")]
    pub value: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: FormId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<FormField>,
    pub settings: FormSettings,
    pub is_published: bool,
    pub is_archived: bool,
    pub response_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FormDBResponse> for FormResponse {
    fn from(db: FormDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            title: db.title,
            description: db.description,
            fields: db.fields.0,
            settings: db.settings.0,
            is_published: db.is_published,
            is_archived: db.is_archived,
            response_count: db.response_count,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// What respondents see: the definition without owner or counters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicFormResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: FormId,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<FormField>,
    pub settings: FormSettings,
}

impl From<FormDBResponse> for PublicFormResponse {
    fn from(db: FormDBResponse) -> Self {
        let mut settings = db.settings.0;
        // The owner's inbox is not for respondents
        settings.notification_email = None;
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            fields: db.fields.0,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_leaves_flags_alone() {
        let update: FormUpdate = serde_json::from_value(json!({"title": "  Intake  "})).unwrap();
        let db: FormUpdateDBRequest = update.into();
        assert_eq!(db.title.as_deref(), Some("Intake"));
        assert!(db.description.is_none());
        assert!(db.is_published.is_none());
        assert!(db.is_archived.is_none());
    }

    #[test]
    fn test_toggle_defaults_to_true() {
        let q: ToggleQuery = serde_urlencoded::from_str("").unwrap();
        assert!(q.value);
        let q: ToggleQuery = serde_urlencoded::from_str("value=false").unwrap();
        assert!(!q.value);
    }

    #[test]
    fn test_list_query_defaults() {
        let q: ListFormsQuery = serde_urlencoded::from_str("limit=5").unwrap();
        assert!(!q.include_archived());
        assert_eq!(q.pagination.params(), (0, 5));

        let q: ListFormsQuery = serde_urlencoded::from_str("include_archived=true").unwrap();
        assert!(q.include_archived());
    }
}

//! API request/response models for organization branding and contact settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::ToSchema;

use super::users::trimmed;
use crate::db::models::organization_settings::{OrganizationSettingsDBResponse, OrganizationSettingsUpdateDBRequest};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationSettingsResponse {
    pub organization_name: Option<String>,
    pub logo_url: Option<String>,
    #[schema(example = "#4f46e5")]
    pub primary_color: String,
    pub contact_email: Option<String>,
    pub website: Option<String>,
    pub mission_statement: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrganizationSettingsDBResponse> for OrganizationSettingsResponse {
    fn from(db: OrganizationSettingsDBResponse) -> Self {
        Self {
            organization_name: db.organization_name,
            logo_url: db.logo_url,
            primary_color: db.primary_color,
            contact_email: db.contact_email,
            website: db.website,
            mission_statement: db.mission_statement,
            updated_at: db.updated_at,
        }
    }
}

/// Partial settings update. Absent fields are unchanged; `null` clears optional ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct OrganizationSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub organization_name: Option<Option<String>>,
    /// Requires the custom branding feature
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub logo_url: Option<Option<String>>,
    /// `#rrggbb`
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub contact_email: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub website: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub mission_statement: Option<Option<String>>,
}

impl OrganizationSettingsUpdate {
    /// Whether the update would set (not clear) a logo
    pub fn sets_logo(&self) -> bool {
        matches!(&self.logo_url, Some(Some(url)) if !url.trim().is_empty())
    }
}

impl From<OrganizationSettingsUpdate> for OrganizationSettingsUpdateDBRequest {
    fn from(update: OrganizationSettingsUpdate) -> Self {
        Self {
            organization_name: update.organization_name.map(trimmed),
            logo_url: update.logo_url.map(trimmed),
            primary_color: update.primary_color.map(|c| c.trim().to_lowercase()),
            contact_email: update.contact_email.map(trimmed),
            website: update.website.map(trimmed),
            mission_statement: update.mission_statement.map(trimmed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_logo() {
        let set: OrganizationSettingsUpdate = serde_json::from_str(r#"{"logo_url": "https://cdn.example.org/logo.png"}"#).unwrap();
        assert!(set.sets_logo());

        let clear: OrganizationSettingsUpdate = serde_json::from_str(r#"{"logo_url": null}"#).unwrap();
        assert!(!clear.sets_logo());

        let blank: OrganizationSettingsUpdate = serde_json::from_str(r#"{"logo_url": " "}"#).unwrap();
        assert!(!blank.sets_logo());

        assert!(!OrganizationSettingsUpdate::default().sets_logo());
    }

    #[test]
    fn test_color_is_normalized() {
        let update: OrganizationSettingsUpdate = serde_json::from_str(r##"{"primary_color": " #AABBCC "}"##).unwrap();
        let db: OrganizationSettingsUpdateDBRequest = update.into();
        assert_eq!(db.primary_color.as_deref(), Some("#aabbcc"));
    }
}

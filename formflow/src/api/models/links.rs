//! API request/response models for saved resource links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::ToSchema;

use super::users::trimmed;
use crate::db::models::links::{LinkCreateDBRequest, LinkDBResponse, LinkUpdateDBRequest};
use crate::types::{LinkId, UserId};

/// Group heading for links without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkCreate {
    #[schema(example = "Grant application portal")]
    pub title: String,
    #[schema(example = "https://grants.example.org")]
    pub url: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub folder: Option<String>,
    pub icon: Option<String>,
}

impl LinkCreate {
    pub fn into_db_request(self, user_id: UserId) -> LinkCreateDBRequest {
        LinkCreateDBRequest {
            user_id,
            title: self.title.trim().to_string(),
            url: self.url.trim().to_string(),
            description: trimmed(self.description),
            category: trimmed(self.category),
            folder: trimmed(self.folder),
            icon: trimmed(self.icon),
        }
    }
}

/// Partial link update. Absent fields are unchanged; `null` clears optional ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LinkUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub folder: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub icon: Option<Option<String>>,
}

impl From<LinkUpdate> for LinkUpdateDBRequest {
    fn from(update: LinkUpdate) -> Self {
        Self {
            title: update.title.map(|t| t.trim().to_string()),
            url: update.url.map(|u| u.trim().to_string()),
            description: update.description.map(trimmed),
            category: update.category.map(trimmed),
            folder: update.folder.map(trimmed),
            icon: update.icon.map(trimmed),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: LinkId,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub folder: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LinkDBResponse> for LinkResponse {
    fn from(db: LinkDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            url: db.url,
            description: db.description,
            category: db.category,
            folder: db.folder,
            icon: db.icon,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkGroup {
    pub category: String,
    pub links: Vec<LinkResponse>,
}

/// Group links by category, keeping the order in which categories first appear
pub fn group_by_category(links: Vec<LinkResponse>) -> Vec<LinkGroup> {
    let mut groups: Vec<LinkGroup> = Vec::new();
    for link in links {
        let category = link.category.clone().unwrap_or_else(|| UNCATEGORIZED.to_string());
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.links.push(link),
            None => groups.push(LinkGroup {
                category,
                links: vec![link],
            }),
        }
    }
    groups
}

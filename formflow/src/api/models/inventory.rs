//! API request/response models for inventory items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use super::users::trimmed;
use crate::db::models::inventory::{InventoryItemCreateDBRequest, InventoryItemDBResponse, InventoryItemUpdateDBRequest, ItemCondition};
use crate::types::{InventoryItemId, UserId};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListInventoryQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only items in this category
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryItemCreate {
    #[schema(example = "Folding tables")]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    #[schema(minimum = 0)]
    pub quantity: i32,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub condition: Option<ItemCondition>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl InventoryItemCreate {
    pub fn into_db_request(self, user_id: UserId) -> InventoryItemCreateDBRequest {
        InventoryItemCreateDBRequest {
            user_id,
            name: self.name.trim().to_string(),
            description: trimmed(self.description),
            quantity: self.quantity,
            unit: trimmed(self.unit),
            category: trimmed(self.category),
            condition: self.condition,
            location: trimmed(self.location),
            notes: trimmed(self.notes),
        }
    }
}

/// Partial item update. Absent fields are unchanged; `null` clears optional ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InventoryItemUpdate {
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[schema(minimum = 0)]
    pub quantity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub unit: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<ItemCondition>)]
    pub condition: Option<Option<ItemCondition>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

impl From<InventoryItemUpdate> for InventoryItemUpdateDBRequest {
    fn from(update: InventoryItemUpdate) -> Self {
        Self {
            name: update.name.map(|n| n.trim().to_string()),
            description: update.description.map(trimmed),
            quantity: update.quantity,
            unit: update.unit.map(trimmed),
            category: update.category.map(trimmed),
            condition: update.condition,
            location: update.location.map(trimmed),
            notes: update.notes.map(trimmed),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryItemResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: InventoryItemId,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub condition: Option<ItemCondition>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InventoryItemDBResponse> for InventoryItemResponse {
    fn from(db: InventoryItemDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            quantity: db.quantity,
            unit: db.unit,
            category: db.category,
            condition: db.condition,
            location: db.location,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

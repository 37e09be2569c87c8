use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{InventoryItemId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum ItemCondition {
    New,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone)]
pub struct InventoryItemCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub condition: Option<ItemCondition>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryItemUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub quantity: Option<i32>,
    pub unit: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub condition: Option<Option<ItemCondition>>,
    pub location: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct InventoryItemDBResponse {
    pub id: InventoryItemId,
    pub user_id: UserId,
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

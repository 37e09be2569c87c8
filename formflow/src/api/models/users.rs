//! API request/response models for the signed-in account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::ToSchema;

use super::billing::SubscriptionResponse;
use crate::db::models::profiles::{ProfileDBResponse, ProfileUpdateDBRequest};
use crate::plans::{Limit, Plan, PlanLimits};
use crate::types::UserId;

/// The authenticated caller, decoded from the session token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub organization_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileDBResponse> for ProfileResponse {
    fn from(db: ProfileDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            full_name: db.full_name,
            organization_name: db.organization_name,
            avatar_url: db.avatar_url,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Partial profile update. Absent fields are unchanged; `null` clears.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub full_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub organization_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub avatar_url: Option<Option<String>>,
}

impl From<ProfileUpdate> for ProfileUpdateDBRequest {
    fn from(update: ProfileUpdate) -> Self {
        Self {
            full_name: update.full_name.map(trimmed),
            organization_name: update.organization_name.map(trimmed),
            avatar_url: update.avatar_url.map(trimmed),
        }
    }
}

/// Blank strings clear a nullable column
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `GET /api/v1/me`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: CurrentUser,
    pub profile: Option<ProfileResponse>,
    pub subscription: Option<SubscriptionResponse>,
    /// The plan limits apply to; `free` when no subscription row exists
    pub plan: Plan,
    pub limits: PlanLimits,
}

/// Current usage against one plan limit
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsageMeter {
    pub used: i64,
    /// Null when unlimited
    #[schema(value_type = Option<u32>)]
    pub limit: Limit,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsageResponse {
    pub forms: UsageMeter,
    pub responses_this_month: UsageMeter,
    pub seats: UsageMeter,
}

/// `GET /api/v1/dashboard`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub active_forms: i64,
    pub total_responses: i64,
    pub inventory_items: i64,
    pub saved_links: i64,
    pub plan: Plan,
    pub usage: UsageResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_distinguishes_null_from_absent() {
        let update: ProfileUpdate = serde_json::from_str(r#"{"full_name": null, "organization_name": "  Aid  "}"#).unwrap();
        let db: ProfileUpdateDBRequest = update.into();

        assert_eq!(db.full_name, Some(None));
        assert_eq!(db.organization_name, Some(Some("Aid".to_string())));
        assert_eq!(db.avatar_url, None);
    }

    #[test]
    fn test_blank_string_clears() {
        let update: ProfileUpdate = serde_json::from_str(r#"{"avatar_url": "   "}"#).unwrap();
        let db: ProfileUpdateDBRequest = update.into();
        assert_eq!(db.avatar_url, Some(None));
    }

    #[test]
    fn test_unlimited_usage_serializes_null() {
        let meter = UsageMeter {
            used: 12,
            limit: Limit::Unlimited,
        };
        assert_eq!(serde_json::to_value(&meter).unwrap(), serde_json::json!({"used": 12, "limit": null}));
    }
}

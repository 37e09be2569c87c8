use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::plans::{BillingCycle, Plan};
use crate::types::UserId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Canceled,
    PastDue,
    Trialing,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::PastDue => "past_due",
            Self::Trialing => "trialing",
        }
    }
}

/// Processor-driven state of a subscription row.
///
/// Written only by the billing webhook handler.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionStateUpdate {
    pub plan: Plan,
    pub billing_cycle: Option<BillingCycle>,
    pub status: SubscriptionStatus,
    pub stripe_subscription_id: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

impl SubscriptionStateUpdate {
    /// State after the processor subscription is gone: back to the free tier
    pub fn free_tier() -> Self {
        Self {
            plan: Plan::Free,
            billing_cycle: None,
            status: SubscriptionStatus::Canceled,
            stripe_subscription_id: None,
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionDBResponse {
    pub id: Uuid,
    pub user_id: UserId,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub plan: Plan,
    pub billing_cycle: Option<BillingCycle>,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

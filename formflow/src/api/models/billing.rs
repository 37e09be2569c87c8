//! API request/response models for plans, subscriptions and hosted billing sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::subscriptions::{SubscriptionDBResponse, SubscriptionStatus};
use crate::plans::{BillingCycle, Plan};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub plan: Plan,
    pub billing_cycle: Option<BillingCycle>,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    /// Whether a processor customer exists, i.e. whether the billing portal is available
    pub has_billing_account: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionDBResponse> for SubscriptionResponse {
    fn from(db: SubscriptionDBResponse) -> Self {
        Self {
            plan: db.plan,
            billing_cycle: db.billing_cycle,
            status: db.status,
            current_period_start: db.current_period_start,
            current_period_end: db.current_period_end,
            cancel_at_period_end: db.cancel_at_period_end,
            has_billing_account: db.stripe_customer_id.is_some_and(|id| !id.is_empty()),
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListPlansQuery {
    /// Price plans for this billing cycle (default: monthly)
    #[serde(default)]
    pub billing_cycle: BillingCycle,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub plan: Plan,
    pub billing_cycle: BillingCycle,
}

/// A hosted page to redirect the user to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedirectResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

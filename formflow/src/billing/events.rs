//! Mapping from verified processor events to subscription row changes.
//!
//! Everything here is pure: [`action_for`] decides what an event means for the store, and
//! [`crate::billing::process_event`] carries it out.

use std::collections::HashMap;

use uuid::Uuid;

use crate::db::models::subscriptions::SubscriptionStateUpdate;
use crate::payment_providers::{ProviderSubscription, USER_ID_METADATA_KEY, WebhookEvent, WebhookEventKind, metadata_value};
use crate::plans::{BillingCycle, Plan};
use crate::types::UserId;

/// What a webhook event asks of the subscription table
#[derive(Debug, Clone, PartialEq)]
pub enum BillingAction {
    /// Copy the processor's view of the subscription onto the tenant's row
    Apply { user_id: UserId, state: SubscriptionStateUpdate },
    /// The processor subscription ended
    ResetToFree { user_id: UserId },
    /// A renewal failed; the tenant is found by retrieving this subscription
    MarkPastDue { subscription_id: String },
    Ignore,
}

pub fn action_for(event: &WebhookEvent) -> BillingAction {
    match &event.kind {
        WebhookEventKind::SubscriptionCreated(subscription) | WebhookEventKind::SubscriptionUpdated(subscription) => {
            match tenant_id(&subscription.metadata, &subscription.id) {
                Some(user_id) => BillingAction::Apply {
                    user_id,
                    state: subscription_state(subscription),
                },
                None => {
                    tracing::info!("Subscription {} carries no tenant id, ignoring {}", subscription.id, event.event_type);
                    BillingAction::Ignore
                }
            }
        }
        WebhookEventKind::SubscriptionDeleted(subscription) => match tenant_id(&subscription.metadata, &subscription.id) {
            Some(user_id) => BillingAction::ResetToFree { user_id },
            None => {
                tracing::info!("Deleted subscription {} carries no tenant id, ignoring", subscription.id);
                BillingAction::Ignore
            }
        },
        WebhookEventKind::InvoicePaymentFailed {
            invoice_id,
            subscription_id,
        } => match subscription_id {
            Some(subscription_id) => BillingAction::MarkPastDue {
                subscription_id: subscription_id.clone(),
            },
            None => {
                tracing::info!("Failed invoice {} is not for a subscription, ignoring", invoice_id);
                BillingAction::Ignore
            }
        },
        WebhookEventKind::Other => {
            tracing::debug!("Ignoring webhook event type: {}", event.event_type);
            BillingAction::Ignore
        }
    }
}

/// Tenant id from subscription metadata
pub fn tenant_id(metadata: &HashMap<String, String>, subscription_id: &str) -> Option<UserId> {
    let raw = metadata_value(metadata, USER_ID_METADATA_KEY)?;
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::warn!("Subscription {} has a malformed {}: {}", subscription_id, USER_ID_METADATA_KEY, raw);
            None
        }
    }
}

pub fn subscription_state(subscription: &ProviderSubscription) -> SubscriptionStateUpdate {
    let plan = match subscription.metadata_value("plan") {
        None => Plan::Free,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("Subscription {}: {}, recording as free", subscription.id, e);
            Plan::Free
        }),
    };
    let billing_cycle = match subscription.metadata_value("billing_cycle") {
        None => BillingCycle::Monthly,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("Subscription {}: {}, recording as monthly", subscription.id, e);
            BillingCycle::Monthly
        }),
    };

    SubscriptionStateUpdate {
        plan,
        billing_cycle: Some(billing_cycle),
        status: subscription.status,
        stripe_subscription_id: Some(subscription.id.clone()),
        current_period_start: subscription.current_period_start,
        current_period_end: subscription.current_period_end,
        cancel_at_period_end: subscription.cancel_at_period_end,
    }
}

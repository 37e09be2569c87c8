//! Subscription billing: hosted checkout and portal sessions, and webhook ingestion.
//!
//! The payment processor owns the subscription lifecycle. This service only starts hosted
//! sessions and mirrors the processor's state onto the `subscriptions` table when webhooks
//! arrive:
//!
//! - [`checkout_url`] resolves the price for a plan and cycle, gets or creates the processor
//!   customer and returns a hosted checkout URL. It records the customer id and nothing else.
//! - [`portal_url`] returns a billing-portal URL for an existing customer.
//! - [`process_event`] applies a verified webhook event. It is the only writer of plan, cycle,
//!   status and period columns.
//!
//! Deliveries are not de-duplicated; every action overwrites the row with the processor's
//! current view, so replays converge.

pub mod events;

use std::collections::BTreeMap;

use sqlx::PgPool;
use tracing::instrument;

use crate::config::Config;
use crate::db::handlers::Subscriptions;
use crate::db::models::subscriptions::{SubscriptionStateUpdate, SubscriptionStatus};
use crate::errors::{Error, Result};
use crate::payment_providers::{CheckoutRequest, PaymentError, PaymentProvider, USER_ID_METADATA_KEY, WebhookEvent};
use crate::plans::{BillingCycle, Plan};
use crate::types::{UserId, abbrev_uuid};
use events::BillingAction;

/// Start a hosted checkout for a paid plan. Returns the URL to redirect the user to.
#[instrument(skip(db, provider, config, email), fields(user_id = %abbrev_uuid(&user_id), plan = %plan, cycle = %cycle), err)]
pub async fn checkout_url(
    db: &PgPool,
    provider: &dyn PaymentProvider,
    config: &Config,
    user_id: UserId,
    email: &str,
    plan: Plan,
    cycle: BillingCycle,
) -> Result<String> {
    let price_id = config.plans.price_id(plan, cycle).ok_or_else(|| Error::BadRequest {
        message: format!("Invalid plan ({plan}) or billing cycle ({cycle})"),
    })?;

    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut subscriptions = Subscriptions::new(&mut conn);

    let existing = subscriptions
        .get_by_user(user_id)
        .await?
        .and_then(|s| s.stripe_customer_id)
        .filter(|id| !id.is_empty());

    let customer_id = match existing {
        Some(id) => id,
        None => {
            let id = provider.create_customer(email, user_id).await?;
            tracing::info!("Created payment customer for user {}", abbrev_uuid(&user_id));
            if !subscriptions.set_customer_id(user_id, &id).await? {
                tracing::warn!("No subscription row for user {} to record customer on", abbrev_uuid(&user_id));
            }
            id
        }
    };

    let metadata = BTreeMap::from([
        (USER_ID_METADATA_KEY.to_string(), user_id.to_string()),
        ("plan".to_string(), plan.to_string()),
        ("billing_cycle".to_string(), cycle.to_string()),
    ]);

    let request = CheckoutRequest {
        customer_id,
        price_id: price_id.to_string(),
        success_url: config.app_link("/settings?checkout=success"),
        cancel_url: config.app_link("/settings?checkout=canceled"),
        metadata,
    };

    Ok(provider.create_checkout_session(&request).await?)
}

/// Open the processor's self-service portal for the user's customer record
#[instrument(skip(db, provider, config), fields(user_id = %abbrev_uuid(&user_id)), err)]
pub async fn portal_url(db: &PgPool, provider: &dyn PaymentProvider, config: &Config, user_id: UserId) -> Result<String> {
    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let customer_id = Subscriptions::new(&mut conn)
        .get_by_user(user_id)
        .await?
        .and_then(|s| s.stripe_customer_id)
        .filter(|id| !id.is_empty())
        .ok_or(PaymentError::NoCustomerId)?;

    Ok(provider
        .create_billing_portal_session(&customer_id, &config.app_link("/settings"))
        .await?)
}

/// Apply a verified webhook event to the subscription table
#[instrument(skip(db, provider, event), fields(event_id = %event.id, event_type = %event.event_type), err)]
pub async fn process_event(db: &PgPool, provider: &dyn PaymentProvider, event: &WebhookEvent) -> Result<()> {
    match events::action_for(event) {
        BillingAction::Apply { user_id, state } => {
            tracing::info!(
                "Applying {} ({}) to subscription of user {}",
                state.plan,
                state.status.as_str(),
                abbrev_uuid(&user_id)
            );
            apply(db, user_id, &state).await
        }
        BillingAction::ResetToFree { user_id } => {
            tracing::info!("Subscription ended, resetting user {} to free", abbrev_uuid(&user_id));
            apply(db, user_id, &SubscriptionStateUpdate::free_tier()).await
        }
        BillingAction::MarkPastDue { subscription_id } => {
            let metadata = provider.subscription_metadata(&subscription_id).await?;
            let Some(user_id) = events::tenant_id(&metadata, &subscription_id) else {
                tracing::info!("Subscription {} carries no tenant id, not marking past due", subscription_id);
                return Ok(());
            };

            let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
            if Subscriptions::new(&mut conn).set_status(user_id, SubscriptionStatus::PastDue).await? {
                tracing::info!("Payment failed, marked user {} past due", abbrev_uuid(&user_id));
            } else {
                tracing::warn!("No subscription row for user {}", abbrev_uuid(&user_id));
            }
            Ok(())
        }
        BillingAction::Ignore => Ok(()),
    }
}

async fn apply(db: &PgPool, user_id: UserId, state: &SubscriptionStateUpdate) -> Result<()> {
    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Subscriptions::new(&mut conn).apply_state(user_id, state).await? {
        tracing::warn!("No subscription row for user {}", abbrev_uuid(&user_id));
    }
    Ok(())
}

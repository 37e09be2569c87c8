//! Stripe payment provider implementation

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use stripe::{Client, ClientBuilder, StripeError};
use stripe_billing::{billing_portal_session::CreateBillingPortalSession, subscription::RetrieveSubscription};
use stripe_checkout::CheckoutSessionMode;
use stripe_checkout::checkout_session::{
    CreateCheckoutSession, CreateCheckoutSessionLineItems, CreateCheckoutSessionSubscriptionData,
};
use stripe_core::customer::CreateCustomer;
use stripe_webhook::{EventObject, Webhook};

use crate::{
    config::StripeConfig,
    db::models::subscriptions::SubscriptionStatus,
    payment_providers::{
        CheckoutRequest, PaymentError, PaymentProvider, ProviderSubscription, Result, USER_ID_METADATA_KEY, WebhookEvent,
        WebhookEventKind,
    },
    types::{UserId, abbrev_uuid},
};

const SIGNATURE_HEADER: &str = "stripe-signature";

/// Stripe payment provider
pub struct StripeProvider {
    api_key: String,
    webhook_secret: String,
    api_base: Option<String>,
}

impl From<StripeConfig> for StripeProvider {
    fn from(config: StripeConfig) -> Self {
        Self::new(config.api_key, config.webhook_secret, config.api_base)
    }
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(api_key: String, webhook_secret: String, api_base: Option<String>) -> Self {
        Self {
            api_key,
            webhook_secret,
            api_base,
        }
    }

    /// Get a Stripe client
    fn client(&self) -> Result<Client> {
        match &self.api_base {
            None => Ok(Client::new(self.api_key.as_str())),
            Some(base) => ClientBuilder::new(self.api_key.as_str()).url(base.as_str()).build().map_err(|e| {
                tracing::error!("Failed to build Stripe client for {}: {:?}", base, e);
                PaymentError::ProviderApi(e.to_string())
            }),
        }
    }
}

fn api_error(action: &'static str) -> impl Fn(StripeError) -> PaymentError {
    move |e| {
        tracing::error!("Failed to {}: {:?}", action, e);
        PaymentError::ProviderApi(e.to_string())
    }
}

/// Collapse Stripe's subscription statuses onto the four the store accepts
fn map_status(status: &str) -> SubscriptionStatus {
    match status {
        "active" => SubscriptionStatus::Active,
        "trialing" => SubscriptionStatus::Trialing,
        "canceled" | "incomplete_expired" => SubscriptionStatus::Canceled,
        "past_due" | "unpaid" | "incomplete" | "paused" => SubscriptionStatus::PastDue,
        other => {
            tracing::warn!("Unknown subscription status {other:?}, recording as past_due");
            SubscriptionStatus::PastDue
        }
    }
}

/// Current period bounds of a subscription object.
///
/// Newer API versions report the period on each subscription item instead of the subscription.
fn period_bounds(object: Option<&Value>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let bound = |key: &str| {
        let object = object?;
        object
            .get(key)
            .filter(|v| !v.is_null())
            .or_else(|| object.pointer(&format!("/items/data/0/{key}")))
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    };
    (bound("current_period_start"), bound("current_period_end"))
}

/// Subscription a failed invoice belongs to, as an id or an expanded object.
///
/// Newer API versions nest it under `parent.subscription_details`.
fn invoice_subscription_id(object: Option<&Value>) -> Option<String> {
    let object = object?;
    let reference = object
        .get("subscription")
        .filter(|v| !v.is_null())
        .or_else(|| object.pointer("/parent/subscription_details/subscription"))?;
    match reference {
        Value::String(id) => Some(id.clone()),
        Value::Object(expanded) => expanded.get("id").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn provider_subscription(
    id: String,
    status: SubscriptionStatus,
    metadata: HashMap<String, String>,
    cancel_at_period_end: bool,
    object: Option<&Value>,
) -> ProviderSubscription {
    let (current_period_start, current_period_end) = period_bounds(object);
    ProviderSubscription {
        id,
        status,
        metadata,
        current_period_start,
        current_period_end,
        cancel_at_period_end,
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_customer(&self, email: &str, user_id: UserId) -> Result<String> {
        let client = self.client()?;

        let customer = CreateCustomer::new()
            .email(email)
            .metadata(HashMap::from([(USER_ID_METADATA_KEY.to_string(), user_id.to_string())]))
            .send(&client)
            .await
            .map_err(api_error("create Stripe customer"))?;

        tracing::info!("Created Stripe customer {} for user {}", customer.id, abbrev_uuid(&user_id));
        Ok(customer.id.to_string())
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String> {
        let client = self.client()?;
        let metadata: HashMap<String, String> = request.metadata.clone().into_iter().collect();

        let checkout_session = CreateCheckoutSession::new()
            .mode(CheckoutSessionMode::Subscription)
            .customer(request.customer_id.as_str())
            .line_items(vec![CreateCheckoutSessionLineItems {
                price: Some(request.price_id.clone()),
                quantity: Some(1),
                ..Default::default()
            }])
            .success_url(request.success_url.as_str())
            .cancel_url(request.cancel_url.as_str())
            .metadata(metadata.clone())
            .subscription_data(CreateCheckoutSessionSubscriptionData {
                metadata: Some(metadata),
                ..Default::default()
            })
            .send(&client)
            .await
            .map_err(api_error("create Stripe checkout session"))?;

        tracing::info!(
            "Created checkout session {} for customer {}",
            checkout_session.id,
            request.customer_id
        );

        checkout_session.url.ok_or_else(|| {
            tracing::error!("Checkout session missing URL");
            PaymentError::ProviderApi("Checkout session missing URL".to_string())
        })
    }

    async fn create_billing_portal_session(&self, customer_id: &str, return_url: &str) -> Result<String> {
        let client = self.client()?;

        let portal_session = CreateBillingPortalSession::new()
            .customer(customer_id)
            .return_url(return_url)
            .send(&client)
            .await
            .map_err(api_error("create Stripe billing portal session"))?;

        Ok(portal_session.url)
    }

    async fn subscription_metadata(&self, subscription_id: &str) -> Result<HashMap<String, String>> {
        let client = self.client()?;

        let subscription = RetrieveSubscription::new(subscription_id)
            .send(&client)
            .await
            .map_err(api_error("retrieve Stripe subscription"))?;

        Ok(subscription.metadata)
    }

    async fn validate_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<Option<WebhookEvent>> {
        // Get the Stripe signature from headers
        let signature = headers
            .get(SIGNATURE_HEADER)
            .ok_or_else(|| {
                tracing::warn!("Missing stripe-signature header");
                PaymentError::MissingSignature
            })?
            .to_str()
            .map_err(|e| {
                tracing::warn!("Invalid stripe-signature header: {:?}", e);
                PaymentError::InvalidData("Invalid stripe-signature header".to_string())
            })?;

        // Validate the webhook signature and construct the event
        let event = Webhook::construct_event(body, signature, &self.webhook_secret).map_err(|e| {
            tracing::warn!("Failed to construct webhook event: {:?}", e);
            PaymentError::InvalidData(format!("Webhook validation failed: {}", e))
        })?;

        let event_type = format!("{:?}", event.type_);
        tracing::trace!("Validated Stripe webhook event {}: {}", event.id, event_type);

        // Fields whose location depends on the API version are read from the raw object
        let raw: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        let object = raw.pointer("/data/object");

        let kind = match event.data.object {
            EventObject::CustomerSubscriptionCreated(subscription) => {
                WebhookEventKind::SubscriptionCreated(provider_subscription(
                    subscription.id.to_string(),
                    map_status(subscription.status.as_str()),
                    subscription.metadata,
                    subscription.cancel_at_period_end,
                    object,
                ))
            }
            EventObject::CustomerSubscriptionUpdated(subscription) => {
                WebhookEventKind::SubscriptionUpdated(provider_subscription(
                    subscription.id.to_string(),
                    map_status(subscription.status.as_str()),
                    subscription.metadata,
                    subscription.cancel_at_period_end,
                    object,
                ))
            }
            EventObject::CustomerSubscriptionDeleted(subscription) => {
                WebhookEventKind::SubscriptionDeleted(provider_subscription(
                    subscription.id.to_string(),
                    map_status(subscription.status.as_str()),
                    subscription.metadata,
                    subscription.cancel_at_period_end,
                    object,
                ))
            }
            EventObject::InvoicePaymentFailed(_) => WebhookEventKind::InvoicePaymentFailed {
                invoice_id: object
                    .and_then(|o| o.get("id"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                subscription_id: invoice_subscription_id(object),
            },
            _ => WebhookEventKind::Other,
        };

        Ok(Some(WebhookEvent {
            id: event.id.to_string(),
            event_type,
            kind,
        }))
    }
}

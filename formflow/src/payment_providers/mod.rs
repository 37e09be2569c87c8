//! Payment provider abstraction layer
//!
//! This module defines the `PaymentProvider` trait which abstracts the hosted subscription billing
//! calls (customers, checkout, billing portal, webhooks) behind one interface. Providers translate
//! processor objects into the types below, so the rest of the service never sees a processor SDK.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{config::PaymentConfig, db::models::subscriptions::SubscriptionStatus, errors::Error, types::UserId};

pub mod dummy;
pub mod stripe;

/// Create a payment provider from configuration
///
/// This is the single point where we convert config into provider instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_provider(config: PaymentConfig) -> Box<dyn PaymentProvider> {
    match config {
        PaymentConfig::Stripe(stripe_config) => Box::new(stripe::StripeProvider::from(stripe_config)),
        PaymentConfig::Dummy(dummy_config) => Box::new(dummy::DummyProvider::from(dummy_config)),
    }
}

/// Result type for payment provider operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider API error: {0}")]
    ProviderApi(String),

    #[error("Missing webhook signature")]
    MissingSignature,

    #[error("Invalid payment data: {0}")]
    InvalidData(String),

    #[error("No Stripe customer found")]
    NoCustomerId,
}

impl From<PaymentError> for Error {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::ProviderApi(message) => Error::Internal {
                operation: format!("call payment provider: {message}"),
            },
            PaymentError::MissingSignature | PaymentError::InvalidData(_) | PaymentError::NoCustomerId => {
                Error::BadRequest { message: err.to_string() }
            }
        }
    }
}

/// Metadata key carrying the tenant id on processor customers, sessions and subscriptions
pub const USER_ID_METADATA_KEY: &str = "formflow_user_id";

/// A subscription-mode checkout session to create.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Copied onto both the session and the subscription it creates
    pub metadata: BTreeMap<String, String>,
}

/// A processor subscription, reduced to what the subscriptions table mirrors.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSubscription {
    pub id: String,
    pub status: SubscriptionStatus,
    pub metadata: HashMap<String, String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

impl ProviderSubscription {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        metadata_value(&self.metadata, key)
    }
}

/// Non-empty metadata value
pub fn metadata_value<'a>(metadata: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    metadata.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// The billing events this service reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEventKind {
    SubscriptionCreated(ProviderSubscription),
    SubscriptionUpdated(ProviderSubscription),
    SubscriptionDeleted(ProviderSubscription),
    InvoicePaymentFailed {
        invoice_id: String,
        subscription_id: Option<String>,
    },
    /// Event types this service does not read
    Other,
}

/// Represents a verified webhook event from a payment provider
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub id: String,
    /// Processor event type, for logging
    pub event_type: String,
    pub kind: WebhookEventKind,
}

/// Abstract payment provider interface
///
/// Implementors provide hosted subscription billing for different processors.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a processor customer for a tenant. Returns the customer id.
    async fn create_customer(&self, email: &str, user_id: UserId) -> Result<String>;

    /// Create a subscription checkout session.
    ///
    /// Returns a URL that the user should be redirected to for payment.
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String>;

    /// Create a billing portal session for customer self-service
    ///
    /// Returns a URL that the user should be redirected to for managing their billing.
    async fn create_billing_portal_session(&self, customer_id: &str, return_url: &str) -> Result<String>;

    /// Metadata of a subscription, fetched from the processor by id
    async fn subscription_metadata(&self, subscription_id: &str) -> Result<HashMap<String, String>>;

    /// Validate and extract webhook event from raw request data
    ///
    /// Returns None if this provider doesn't support webhooks.
    /// Returns Err if validation fails (invalid signature, malformed data, etc.)
    async fn validate_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<Option<WebhookEvent>>;
}

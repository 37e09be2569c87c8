//! Dummy payment provider implementation
//!
//! Checkout redirects straight back to the success URL and no webhooks are ever delivered, so
//! the subscription row stays on its current plan. Useful for local development of the billing
//! screens without processor credentials.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    config::DummyConfig,
    payment_providers::{CheckoutRequest, PaymentError, PaymentProvider, Result, WebhookEvent},
    types::UserId,
};

/// Dummy payment provider
pub struct DummyProvider {
    portal_url: Option<String>,
}

impl From<DummyConfig> for DummyProvider {
    fn from(config: DummyConfig) -> Self {
        Self {
            portal_url: config.portal_url,
        }
    }
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    async fn create_customer(&self, _email: &str, user_id: UserId) -> Result<String> {
        Ok(format!("cus_dummy_{}", user_id.simple()))
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String> {
        tracing::info!(
            "Dummy provider created checkout session for customer {} on price {}",
            request.customer_id,
            request.price_id
        );
        Ok(request.success_url.clone())
    }

    async fn create_billing_portal_session(&self, _customer_id: &str, return_url: &str) -> Result<String> {
        Ok(self.portal_url.clone().unwrap_or_else(|| return_url.to_string()))
    }

    async fn subscription_metadata(&self, subscription_id: &str) -> Result<HashMap<String, String>> {
        Err(PaymentError::InvalidData(format!(
            "Dummy provider has no subscription '{subscription_id}'"
        )))
    }

    async fn validate_webhook(&self, _headers: &axum::http::HeaderMap, _body: &str) -> Result<Option<WebhookEvent>> {
        // Dummy provider doesn't use webhooks
        Ok(None)
    }
}

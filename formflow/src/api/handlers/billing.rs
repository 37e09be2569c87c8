use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};

use crate::{
    AppState,
    api::models::{
        billing::{CheckoutRequest, ListPlansQuery, RedirectResponse, SubscriptionResponse, WebhookAck},
        users::CurrentUser,
    },
    billing,
    db::handlers::Subscriptions,
    errors::{Error, Result},
    payment_providers::PaymentProvider,
    plans::{Plan, PlanDisplayInfo, display_info},
};

fn provider(state: &AppState) -> Result<&dyn PaymentProvider> {
    state.payment_provider.as_deref().ok_or_else(|| Error::NotConfigured {
        feature: "Billing".to_string(),
    })
}

/// Pricing for every tier in the requested billing cycle
#[utoipa::path(
    get,
    path = "/plans",
    tag = "billing",
    params(ListPlansQuery),
    responses(
        (status = 200, description = "Plans in display order", body = Vec<PlanDisplayInfo>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_plans(State(state): State<AppState>, Query(query): Query<ListPlansQuery>) -> Json<Vec<PlanDisplayInfo>> {
    Json(
        Plan::ALL
            .iter()
            .map(|plan| display_info(*plan, query.billing_cycle, &state.config.plans))
            .collect(),
    )
}

#[utoipa::path(
    get,
    path = "/subscription",
    tag = "billing",
    responses(
        (status = 200, description = "The account's subscription", body = SubscriptionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No subscription row"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_subscription(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<SubscriptionResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subscription = Subscriptions::new(&mut pool_conn)
        .get_by_user(current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Subscription".to_string(),
            id: current_user.id.to_string(),
        })?;
    Ok(Json(subscription.into()))
}

/// Start a hosted checkout for a paid plan
#[utoipa::path(
    post,
    path = "/billing/checkout",
    tag = "billing",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout URL to redirect to", body = RedirectResponse),
        (status = 400, description = "Free plan, or no price configured for the plan and cycle"),
        (status = 401, description = "Unauthorized"),
        (status = 501, description = "Billing is not configured"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_checkout(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<RedirectResponse>> {
    let provider = provider(&state)?;
    let url = billing::checkout_url(
        &state.db,
        provider,
        &state.config,
        current_user.id,
        &current_user.email,
        request.plan,
        request.billing_cycle,
    )
    .await?;
    Ok(Json(RedirectResponse { url }))
}

/// Open the self-service billing portal
#[utoipa::path(
    post,
    path = "/billing/portal",
    tag = "billing",
    responses(
        (status = 200, description = "Portal URL to redirect to", body = RedirectResponse),
        (status = 400, description = "No billing account yet"),
        (status = 401, description = "Unauthorized"),
        (status = 501, description = "Billing is not configured"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_portal(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<RedirectResponse>> {
    let provider = provider(&state)?;
    let url = billing::portal_url(&state.db, provider, &state.config, current_user.id).await?;
    Ok(Json(RedirectResponse { url }))
}

/// Receive subscription lifecycle events from the payment processor.
///
/// Authenticated by the signature header rather than a session.
#[utoipa::path(
    post,
    path = "/webhooks/billing",
    tag = "billing",
    request_body(content = String, description = "Raw event body", content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature, or malformed event"),
        (status = 500, description = "Event could not be applied"),
        (status = 501, description = "Billing is not configured"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn billing_webhook(State(state): State<AppState>, headers: HeaderMap, body: String) -> Result<Json<WebhookAck>> {
    let provider = provider(&state)?;

    let Some(event) = provider.validate_webhook(&headers, &body).await? else {
        tracing::debug!("Payment provider does not deliver webhooks, ignoring");
        return Ok(Json(WebhookAck { received: true }));
    };

    tracing::info!("Received billing event {} ({})", event.id, event.event_type);

    if let Err(e) = billing::process_event(&state.db, provider, &event).await {
        tracing::error!("Failed to process billing event {}: {:#}", event.id, e);
        return Err(Error::Internal {
            operation: format!("process billing event {}", event.id),
        });
    }

    Ok(Json(WebhookAck { received: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::create_session_token;
    use crate::config::{PaymentConfig, StripeConfig};
    use crate::db::models::subscriptions::SubscriptionStatus;
    use crate::payment_providers::{
        CheckoutRequest, PaymentError, PaymentProvider, ProviderSubscription, WebhookEvent, WebhookEventKind, create_provider,
    };
    use crate::test_utils::{create_test_account, lazy_pool, test_config};
    use crate::types::UserId;
    use async_trait::async_trait;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sqlx::PgPool;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Processor stand-in that hands back a fixed event for any signed delivery
    #[derive(Default)]
    struct StubProvider {
        event: Option<WebhookEvent>,
        metadata: Option<HashMap<String, String>>,
    }

    #[async_trait]
    impl PaymentProvider for StubProvider {
        async fn create_customer(&self, _email: &str, _user_id: UserId) -> crate::payment_providers::Result<String> {
            Ok("cus_stub".to_string())
        }

        async fn create_checkout_session(&self, request: &CheckoutRequest) -> crate::payment_providers::Result<String> {
            Ok(format!("https://checkout.example/{}", request.price_id))
        }

        async fn create_billing_portal_session(
            &self,
            _customer_id: &str,
            return_url: &str,
        ) -> crate::payment_providers::Result<String> {
            Ok(return_url.to_string())
        }

        async fn subscription_metadata(&self, _subscription_id: &str) -> crate::payment_providers::Result<HashMap<String, String>> {
            self.metadata
                .clone()
                .ok_or_else(|| PaymentError::ProviderApi("subscription lookup failed".to_string()))
        }

        async fn validate_webhook(&self, headers: &HeaderMap, _body: &str) -> crate::payment_providers::Result<Option<WebhookEvent>> {
            if !headers.contains_key("stripe-signature") {
                return Err(PaymentError::MissingSignature);
            }
            Ok(self.event.clone())
        }
    }

    fn stripe_provider() -> Arc<dyn PaymentProvider> {
        Arc::from(create_provider(PaymentConfig::Stripe(StripeConfig {
            api_key: "sk_test_123".to_string(),
            webhook_secret: "whsec_test".to_string(),
            api_base: None,
        })))
    }

    fn billing_router(pool: PgPool, provider: Option<Arc<dyn PaymentProvider>>) -> axum::Router {
        let mut config = test_config();
        config.plans.starter.monthly_price_id = Some("price_starter_monthly".to_string());
        let state = AppState::builder()
            .db(pool)
            .config(config)
            .maybe_payment_provider(provider)
            .build();

        axum::Router::new()
            .route("/plans", get(list_plans))
            .route("/subscription", get(get_subscription))
            .route("/billing/checkout", post(create_checkout))
            .route("/billing/portal", post(create_portal))
            .route("/webhooks/billing", post(billing_webhook))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_plans_are_public() {
        let server = TestServer::new(billing_router(lazy_pool(), None)).unwrap();

        let plans: Value = server.get("/plans").add_query_param("billing_cycle", "yearly").await.json();
        let plans = plans.as_array().unwrap();
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0]["plan"], "free");
        assert_eq!(plans[0]["display_price"], "Free");
        assert_eq!(plans[2]["billing_label"], "billed annually");
        assert_eq!(plans[2]["limits"]["forms"], Value::Null);
    }

    #[tokio::test]
    async fn test_billing_not_configured() {
        let server = TestServer::new(billing_router(lazy_pool(), None)).unwrap();

        server
            .post("/webhooks/billing")
            .text("{}")
            .await
            .assert_status(StatusCode::NOT_IMPLEMENTED);

        let token = create_session_token(
            &CurrentUser {
                id: uuid::Uuid::new_v4(),
                email: "ada@example.org".to_string(),
            },
            &test_config(),
        )
        .unwrap();
        server
            .post("/billing/portal")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_unsigned_webhook_rejected() {
        let server = TestServer::new(billing_router(lazy_pool(), Some(stripe_provider()))).unwrap();
        let body = r#"{"id":"evt_1","type":"customer.subscription.deleted","data":{"object":{"id":"sub_1","object":"subscription","status":"canceled"}}}"#;

        server
            .post("/webhooks/billing")
            .text(body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/webhooks/billing")
            .add_header("stripe-signature", "t=1,v1=deadbeef")
            .text(body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_event_without_tenant_is_acknowledged() {
        let provider = StubProvider {
            event: Some(WebhookEvent {
                id: "evt_2".to_string(),
                event_type: "CustomerSubscriptionUpdated".to_string(),
                kind: WebhookEventKind::SubscriptionUpdated(ProviderSubscription {
                    id: "sub_2".to_string(),
                    status: SubscriptionStatus::Active,
                    metadata: HashMap::new(),
                    current_period_start: None,
                    current_period_end: None,
                    cancel_at_period_end: false,
                }),
            }),
            metadata: None,
        };
        let server = TestServer::new(billing_router(lazy_pool(), Some(Arc::new(provider)))).unwrap();

        let response = server
            .post("/webhooks/billing")
            .add_header("stripe-signature", "t=1,v1=stub")
            .text("{}")
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({"received": true}));
    }

    #[tokio::test]
    async fn test_processing_failure_is_500() {
        // Subscription lookup for the failed invoice errors, so the processor should redeliver
        let provider = StubProvider {
            event: Some(WebhookEvent {
                id: "evt_3".to_string(),
                event_type: "InvoicePaymentFailed".to_string(),
                kind: WebhookEventKind::InvoicePaymentFailed {
                    invoice_id: "in_3".to_string(),
                    subscription_id: Some("sub_3".to_string()),
                },
            }),
            metadata: None,
        };
        let server = TestServer::new(billing_router(lazy_pool(), Some(Arc::new(provider)))).unwrap();

        server
            .post("/webhooks/billing")
            .add_header("stripe-signature", "t=1,v1=stub")
            .text("{}")
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[sqlx::test]
    async fn test_checkout_records_customer(pool: PgPool) {
        let user_id = create_test_account(&pool, "checkout@example.org").await;
        let token = create_session_token(
            &CurrentUser {
                id: user_id,
                email: "checkout@example.org".to_string(),
            },
            &test_config(),
        )
        .unwrap();
        let server = TestServer::new(billing_router(pool, Some(Arc::new(StubProvider::default())))).unwrap();

        let response = server
            .post("/billing/checkout")
            .authorization_bearer(&token)
            .json(&json!({"plan": "starter", "billing_cycle": "monthly"}))
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<RedirectResponse>().url,
            "https://checkout.example/price_starter_monthly"
        );

        server
            .post("/billing/checkout")
            .authorization_bearer(&token)
            .json(&json!({"plan": "free", "billing_cycle": "monthly"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let subscription: Value = server.get("/subscription").authorization_bearer(&token).await.json();
        assert_eq!(subscription["has_billing_account"], true);
        assert_eq!(subscription["plan"], "free");

        let portal = server.post("/billing/portal").authorization_bearer(&token).await;
        portal.assert_status_ok();
        assert!(portal.json::<RedirectResponse>().url.ends_with("/settings"));
    }
}

//! # formflow: back office for non-profit organizations
//!
//! `formflow` is the HTTP backend behind a multi-tenant web application where small non-profits
//! build forms, collect public submissions, keep an inventory, curate links, invite a team and
//! pay for a subscription plan.
//!
//! ## Overview
//!
//! Every account is a tenant. The person who registers owns their forms, submissions, links,
//! inventory items, organization settings and team invitations; every query is scoped to that
//! owner and a row belonging to someone else answers 404. Anonymous visitors only see forms that
//! are published and not archived, and may submit responses to them.
//!
//! Plans gate usage. The free tier allows three active forms, a hundred responses per month and
//! a single seat; paid tiers raise those limits and unlock features such as CSV export and
//! custom branding. Limits are checked at the point of use and answer `402 Payment Required`.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) with PostgreSQL through
//! SQLx for persistence.
//!
//! - The **API layer** ([`api`]) exposes `/authentication/*` for sessions and `/api/v1/*` for
//!   everything else. Public form routes live under `/api/v1/public/*` and need no session.
//! - The **authentication layer** ([`auth`]) issues HS256 JWT sessions, delivered both as a
//!   cookie and in the response body, and resolves the
//!   [`CurrentUser`](api::models::users::CurrentUser) extractor from either.
//! - The **database layer** ([`db`]) holds one repository per table over a borrowed connection
//!   so handlers can compose them inside a transaction.
//! - **Domain modules** ([`forms`], [`reports`], [`plans`], [`usage`], [`billing`]) keep the
//!   rules that do not need a database: form definitions and answer validation, report
//!   aggregation and CSV rendering, plan tables, and billing event interpretation.
//! - **Payment providers** (`payment_providers`) talk to the processor. Stripe is the real one;
//!   the dummy provider serves local development.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use formflow::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = formflow::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     formflow::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations are embedded and run on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! formflow::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod errors;
pub mod forms;
mod openapi;
pub mod payment_providers;
pub mod plans;
pub mod reports;
pub mod telemetry;
pub mod types;
pub mod usage;
pub mod validation;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Router,
    http::{self, HeaderValue},
    routing::{delete, get, patch, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
use config::CorsOrigin;
use openapi::ApiDoc;
use payment_providers::PaymentProvider;
pub use types::UserId;

/// Application state shared across all request handlers.
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file and environment
/// - `payment_provider`: Present when `payment` is configured; billing routes answer 501 otherwise
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .maybe_payment_provider(provider)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub payment_provider: Option<Arc<dyn PaymentProvider>>,
}

/// Get the formflow database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

#[instrument(skip_all)]
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool_settings = &config.database.pool;
    let pool = PgPoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .min_connections(pool_settings.min_connections)
        .acquire_timeout(pool_settings.acquire_timeout)
        .idle_timeout(pool_settings.idle_timeout)
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PATCH,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::CONTENT_DISPOSITION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// - `/authentication/*`: register, login, logout, password change and strength
/// - `/api/v1/*`: the session-authenticated API plus the public form routes
/// - `/webhooks/billing`: payment processor events, verified by signature
/// - `/docs` and `/api-docs/openapi.json`: API reference
/// - `/internal/metrics`: Prometheus metrics, when `enable_metrics` is set
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{account, auth, billing, forms, inventory, links, reports, settings, submissions, team};

    let auth_routes = Router::new()
        .route("/authentication/register", post(auth::register))
        .route("/authentication/login", post(auth::login))
        .route("/authentication/logout", post(auth::logout))
        .route("/authentication/password-change", post(auth::change_password))
        .route("/authentication/password-strength", post(auth::check_password_strength))
        .with_state(state.clone());

    let api_routes = Router::new()
        // Account
        .route("/me", get(account::get_me))
        .route("/profile", get(account::get_profile).patch(account::update_profile))
        .route("/dashboard", get(account::get_dashboard))
        // Forms
        .route("/forms", get(forms::list_forms).post(forms::create_form))
        .route(
            "/forms/{id}",
            get(forms::get_form).patch(forms::update_form).delete(forms::delete_form),
        )
        .route("/forms/{id}/archive", post(forms::archive_form))
        .route("/forms/{id}/publish", post(forms::publish_form))
        .route("/forms/{id}/submissions", get(submissions::list_submissions))
        .route("/forms/{id}/report", get(reports::get_form_report))
        .route("/forms/{id}/export", get(reports::export_submissions))
        .route("/submissions/{id}", delete(submissions::delete_submission))
        .route("/reports/overview", get(reports::get_overview))
        // Public forms
        .route("/public/forms/{id}", get(submissions::get_public_form))
        .route("/public/forms/{id}/submissions", post(submissions::submit_public_form))
        // Links
        .route("/links", get(links::list_links).post(links::create_link))
        .route("/links/grouped", get(links::list_links_grouped))
        .route("/links/{id}", patch(links::update_link).delete(links::delete_link))
        // Inventory
        .route("/inventory", get(inventory::list_inventory).post(inventory::create_item))
        .route(
            "/inventory/{id}",
            get(inventory::get_item).patch(inventory::update_item).delete(inventory::delete_item),
        )
        // Organization
        .route("/settings/organization", get(settings::get_settings).patch(settings::update_settings))
        .route("/team", get(team::list_team).post(team::invite_member))
        .route("/team/{id}", patch(team::update_member).delete(team::remove_member))
        .route("/team/{id}/accept", post(team::accept_invitation))
        // Billing
        .route("/plans", get(billing::list_plans))
        .route("/subscription", get(billing::get_subscription))
        .route("/billing/checkout", post(billing::create_checkout))
        .route("/billing/portal", post(billing::create_portal))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        // Webhook routes (external services, authenticated by signature)
        .route("/webhooks/billing", post(billing::billing_webhook))
        .with_state(state.clone())
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let mut router = router.layer(create_cors_layer(&state.config)?);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Connect to the database, run migrations and build the router
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting formflow with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let payment_provider = config.payment.clone().map(|payment| {
            let provider: Arc<dyn PaymentProvider> = Arc::from(payment_providers::create_provider(payment));
            provider
        });
        if payment_provider.is_none() {
            info!("No payment provider configured; billing endpoints will answer 501");
        }

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .maybe_payment_provider(payment_provider)
            .build();
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "FormFlow listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{TEST_PASSWORD, create_test_account, lazy_pool, test_state};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_health_and_docs_are_public() {
        let server = TestServer::new(build_router(&test_state(lazy_pool())).unwrap()).unwrap();

        let health = server.get("/healthz").await;
        health.assert_status_ok();
        assert_eq!(health.text(), "OK");

        let doc: Value = server.get("/api-docs/openapi.json").await.json();
        assert_eq!(doc["info"]["title"], "FormFlow API");
        assert!(doc["paths"]["/api/v1/forms"].is_object());

        server.get("/docs").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_api_routes_require_a_session() {
        let server = TestServer::new(build_router(&test_state(lazy_pool())).unwrap()).unwrap();

        for path in ["/api/v1/me", "/api/v1/forms", "/api/v1/links/grouped", "/api/v1/team", "/api/v1/dashboard"] {
            server.get(path).await.assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_billing_without_provider_is_not_implemented() {
        let server = TestServer::new(build_router(&test_state(lazy_pool())).unwrap()).unwrap();
        server
            .post("/webhooks/billing")
            .text("{}")
            .await
            .assert_status(StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_metrics_route_only_when_enabled() {
        let server = TestServer::new(build_router(&test_state(lazy_pool())).unwrap()).unwrap();
        server.get("/internal/metrics").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_login_then_use_the_api(pool: PgPool) {
        create_test_account(&pool, "owner@example.org").await;
        let server = TestServer::new(build_router(&test_state(pool)).unwrap()).unwrap();

        let login: Value = server
            .post("/authentication/login")
            .json(&json!({"email": "owner@example.org", "password": TEST_PASSWORD}))
            .await
            .json();
        let token = login["token"].as_str().unwrap().to_string();

        let form: Value = server
            .post("/api/v1/forms")
            .authorization_bearer(&token)
            .json(&json!({
                "title": "Food bank sign-up",
                "fields": [{"id": "name", "type": "text", "label": "Name", "required": true}]
            }))
            .await
            .json();
        let form_id = form["id"].as_str().unwrap().to_string();

        // Drafts are invisible to the public
        server
            .get(&format!("/api/v1/public/forms/{form_id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .post(&format!("/api/v1/forms/{form_id}/publish"))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
        server
            .post(&format!("/api/v1/public/forms/{form_id}/submissions"))
            .json(&json!({"data": {"name": "Ada"}}))
            .await
            .assert_status(StatusCode::CREATED);

        let dashboard: Value = server.get("/api/v1/dashboard").authorization_bearer(&token).await.json();
        assert_eq!(dashboard["usage"]["forms"]["used"], 1);
        assert_eq!(dashboard["usage"]["responses_this_month"]["used"], 1);
    }
}

use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        billing::SubscriptionResponse,
        users::{CurrentUser, DashboardResponse, MeResponse, ProfileResponse, ProfileUpdate, UsageMeter, UsageResponse},
    },
    db::{
        handlers::{Forms, InventoryItems, Links, Profiles, Subscriptions},
        models::profiles::ProfileUpdateDBRequest,
    },
    errors::{Error, Result},
    plans::Plan,
    usage::{Usage, current_usage},
};

fn not_found_profile(current_user: &CurrentUser) -> Error {
    Error::NotFound {
        resource: "Profile".to_string(),
        id: current_user.id.to_string(),
    }
}

fn usage_response(plan: Plan, usage: Usage) -> UsageResponse {
    let limits = plan.limits();
    UsageResponse {
        forms: UsageMeter {
            used: usage.forms,
            limit: limits.forms,
        },
        responses_this_month: UsageMeter {
            used: usage.responses_this_month,
            limit: limits.responses_per_month,
        },
        seats: UsageMeter {
            used: usage.seats,
            limit: crate::plans::Limit::Limited(limits.seats),
        },
    }
}

/// The signed-in account with its profile, subscription and effective plan
#[utoipa::path(
    get,
    path = "/me",
    tag = "account",
    responses(
        (status = 200, description = "Current account", body = MeResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<MeResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let profile = Profiles::new(&mut pool_conn).get_by_id(current_user.id).await?;
    let subscription = Subscriptions::new(&mut pool_conn).get_by_user(current_user.id).await?;
    // No row reads as the free tier
    let plan = subscription.as_ref().map(|s| s.plan).unwrap_or_default();

    Ok(Json(MeResponse {
        user: current_user,
        profile: profile.map(ProfileResponse::from),
        subscription: subscription.map(SubscriptionResponse::from),
        plan,
        limits: plan.limits(),
    }))
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "account",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No profile for this account"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ProfileResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let profile = Profiles::new(&mut pool_conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| not_found_profile(&current_user))?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    patch,
    path = "/profile",
    tag = "account",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>> {
    let request = ProfileUpdateDBRequest::from(update);
    if let Some(Some(url)) = &request.avatar_url
        && !crate::validation::is_http_url(url)
    {
        return Err(Error::BadRequest {
            message: "Avatar URL must be an http(s) URL".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let profile = Profiles::new(&mut pool_conn).update(current_user.id, &request).await?;
    Ok(Json(profile.into()))
}

/// Headline counts and plan usage for the dashboard
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "account",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_dashboard(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<DashboardResponse>> {
    let owner = current_user.id;
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let plan = Subscriptions::new(&mut tx).effective_plan(owner).await?;
    let usage = current_usage(&mut tx, owner).await?;
    let total_responses = Forms::new(&mut tx).total_responses(owner).await?;
    let inventory_items = InventoryItems::new(&mut tx).count(owner).await?;
    let saved_links = Links::new(&mut tx).count(owner).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(DashboardResponse {
        active_forms: usage.forms,
        total_responses,
        inventory_items,
        saved_links,
        plan,
        usage: usage_response(plan, usage),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::create_session_token;
    use crate::test_utils::{create_test_account, lazy_pool, test_config, test_state};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn account_router(state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/me", get(get_me))
            .route("/profile", get(get_profile).patch(update_profile))
            .route("/dashboard", get(get_dashboard))
            .with_state(state)
    }

    fn token_for(id: crate::types::UserId, email: &str) -> String {
        create_session_token(
            &CurrentUser {
                id,
                email: email.to_string(),
            },
            &test_config(),
        )
        .unwrap()
    }

    #[test]
    fn test_usage_response_limits() {
        let usage = usage_response(
            Plan::Mission,
            Usage {
                forms: 40,
                responses_this_month: 5000,
                seats: 4,
            },
        );
        let value = serde_json::to_value(&usage).unwrap();
        assert_eq!(value["forms"], json!({"used": 40, "limit": null}));
        assert_eq!(value["seats"], json!({"used": 4, "limit": 10}));
    }

    #[tokio::test]
    async fn test_requires_session() {
        let server = TestServer::new(account_router(test_state(lazy_pool()))).unwrap();
        server.get("/me").await.assert_status(StatusCode::UNAUTHORIZED);
        server.get("/dashboard").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/profile")
            .authorization_bearer("not-a-token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_me_and_dashboard_for_new_account(pool: PgPool) {
        let user_id = create_test_account(&pool, "me@example.org").await;
        let token = token_for(user_id, "me@example.org");
        let server = TestServer::new(account_router(test_state(pool))).unwrap();

        let me: Value = server.get("/me").authorization_bearer(&token).await.json();
        assert_eq!(me["plan"], "free");
        assert_eq!(me["limits"]["forms"], 3);
        assert_eq!(me["subscription"]["status"], "active");

        let dashboard: Value = server.get("/dashboard").authorization_bearer(&token).await.json();
        assert_eq!(dashboard["active_forms"], 0);
        assert_eq!(dashboard["total_responses"], 0);
        assert_eq!(dashboard["usage"]["seats"]["used"], 1);
    }

    #[sqlx::test]
    async fn test_profile_update(pool: PgPool) {
        let user_id = create_test_account(&pool, "profile@example.org").await;
        let token = token_for(user_id, "profile@example.org");
        let server = TestServer::new(account_router(test_state(pool))).unwrap();

        let response = server
            .patch("/profile")
            .authorization_bearer(&token)
            .json(&json!({"full_name": "Grace Hopper", "organization_name": null}))
            .await;
        response.assert_status_ok();
        let profile: ProfileResponse = response.json();
        assert_eq!(profile.full_name.as_deref(), Some("Grace Hopper"));
        assert_eq!(profile.organization_name, None);

        server
            .patch("/profile")
            .authorization_bearer(&token)
            .json(&json!({"avatar_url": "ftp://example.org/me.png"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

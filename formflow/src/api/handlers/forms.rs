use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::PgConnection;

use crate::{
    AppState,
    api::models::{
        forms::{FormCreate, FormResponse, FormUpdate, ListFormsQuery, ToggleQuery},
        users::CurrentUser,
    },
    db::{
        handlers::{Forms, Repository, Subscriptions, forms::FormFilter},
        models::forms::{FormDBResponse, FormUpdateDBRequest},
    },
    errors::{Error, Result},
    forms::validate_definition,
    types::{FormId, abbrev_uuid},
    usage::{check_file_fields, check_form_limit},
};

fn form_not_found(id: FormId) -> Error {
    Error::NotFound {
        resource: "Form".to_string(),
        id: id.to_string(),
    }
}

/// Load a form owned by the caller. Other tenants' forms read as missing.
pub(crate) async fn owned_form(conn: &mut PgConnection, id: FormId, current_user: &CurrentUser) -> Result<FormDBResponse> {
    Forms::new(conn)
        .get_by_id(id)
        .await?
        .filter(|form| form.user_id == current_user.id)
        .ok_or_else(|| form_not_found(id))
}

#[utoipa::path(
    get,
    path = "/forms",
    tag = "forms",
    summary = "List forms",
    params(ListFormsQuery),
    responses(
        (status = 200, description = "The caller's forms, newest first", body = Vec<FormResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_forms(
    State(state): State<AppState>,
    Query(query): Query<ListFormsQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<FormResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = FormFilter::new(current_user.id, skip, limit).with_archived(query.include_archived());

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let forms = Forms::new(&mut pool_conn).list(&filter).await?;
    Ok(Json(forms.into_iter().map(FormResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/forms",
    tag = "forms",
    summary = "Create form",
    request_body = FormCreate,
    responses(
        (status = 201, description = "Form created", body = FormResponse),
        (status = 400, description = "Invalid form definition"),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "Plan form limit reached, or file fields on a plan without file uploads"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_form(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<FormCreate>,
) -> Result<(StatusCode, Json<FormResponse>)> {
    validate_definition(&create.title, &create.fields, &create.settings)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let plan = Subscriptions::new(&mut pool_conn).effective_plan(current_user.id).await?;
    check_file_fields(plan, &create.fields)?;
    let mut forms = Forms::new(&mut pool_conn);
    check_form_limit(plan, forms.count_active(current_user.id).await?)?;

    let form = forms.create(&create.into_db_request(current_user.id)).await?;
    tracing::info!("Created form {} for user {}", abbrev_uuid(&form.id), abbrev_uuid(&current_user.id));
    Ok((StatusCode::CREATED, Json(form.into())))
}

#[utoipa::path(
    get,
    path = "/forms/{id}",
    tag = "forms",
    summary = "Get form",
    params(("id" = uuid::Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Form", body = FormResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Form not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_form(State(state): State<AppState>, Path(id): Path<FormId>, current_user: CurrentUser) -> Result<Json<FormResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let form = owned_form(&mut pool_conn, id, &current_user).await?;
    Ok(Json(form.into()))
}

#[utoipa::path(
    patch,
    path = "/forms/{id}",
    tag = "forms",
    summary = "Update form",
    request_body = FormUpdate,
    params(("id" = uuid::Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Updated form", body = FormResponse),
        (status = 400, description = "Invalid form definition"),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "File fields on a plan without file uploads"),
        (status = 404, description = "Form not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<FormId>,
    current_user: CurrentUser,
    Json(update): Json<FormUpdate>,
) -> Result<Json<FormResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let existing = owned_form(&mut pool_conn, id, &current_user).await?;

    // Validate the definition as it will be after the update
    validate_definition(
        update.title.as_deref().unwrap_or(&existing.title),
        update.fields.as_deref().unwrap_or(&existing.fields.0),
        update.settings.as_ref().unwrap_or(&existing.settings.0),
    )?;
    if let Some(fields) = &update.fields {
        let plan = Subscriptions::new(&mut pool_conn).effective_plan(current_user.id).await?;
        check_file_fields(plan, fields)?;
    }

    let form = Forms::new(&mut pool_conn).update(id, &update.into()).await?;
    Ok(Json(form.into()))
}

#[utoipa::path(
    delete,
    path = "/forms/{id}",
    tag = "forms",
    summary = "Delete form",
    params(("id" = uuid::Uuid, Path, description = "Form ID")),
    responses(
        (status = 204, description = "Form and its submissions deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Form not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_form(State(state): State<AppState>, Path(id): Path<FormId>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_form(&mut pool_conn, id, &current_user).await?;

    if !Forms::new(&mut pool_conn).delete(id).await? {
        return Err(form_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Archive a form (`?value=false` restores it). Archived forms stop accepting submissions
/// and do not count towards the plan's form limit.
#[utoipa::path(
    post,
    path = "/forms/{id}/archive",
    tag = "forms",
    summary = "Archive or restore form",
    params(("id" = uuid::Uuid, Path, description = "Form ID"), ToggleQuery),
    responses(
        (status = 200, description = "Updated form", body = FormResponse),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "Restoring would exceed the plan form limit"),
        (status = 404, description = "Form not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn archive_form(
    State(state): State<AppState>,
    Path(id): Path<FormId>,
    Query(toggle): Query<ToggleQuery>,
    current_user: CurrentUser,
) -> Result<Json<FormResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let existing = owned_form(&mut pool_conn, id, &current_user).await?;

    if existing.is_archived && !toggle.value {
        let plan = Subscriptions::new(&mut pool_conn).effective_plan(current_user.id).await?;
        let active = Forms::new(&mut pool_conn).count_active(current_user.id).await?;
        check_form_limit(plan, active)?;
    }

    let request = FormUpdateDBRequest {
        is_archived: Some(toggle.value),
        ..Default::default()
    };
    let form = Forms::new(&mut pool_conn).update(id, &request).await?;
    Ok(Json(form.into()))
}

/// Publish a form (`?value=false` unpublishes it)
#[utoipa::path(
    post,
    path = "/forms/{id}/publish",
    tag = "forms",
    summary = "Publish or unpublish form",
    params(("id" = uuid::Uuid, Path, description = "Form ID"), ToggleQuery),
    responses(
        (status = 200, description = "Updated form", body = FormResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Form not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn publish_form(
    State(state): State<AppState>,
    Path(id): Path<FormId>,
    Query(toggle): Query<ToggleQuery>,
    current_user: CurrentUser,
) -> Result<Json<FormResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_form(&mut pool_conn, id, &current_user).await?;

    let request = FormUpdateDBRequest {
        is_published: Some(toggle.value),
        ..Default::default()
    };
    let form = Forms::new(&mut pool_conn).update(id, &request).await?;
    Ok(Json(form.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::create_session_token;
    use crate::db::models::subscriptions::{SubscriptionStateUpdate, SubscriptionStatus};
    use crate::plans::{BillingCycle, Plan};
    use crate::test_utils::{create_test_account, lazy_pool, test_config, test_state};
    use axum::routing::{get, post};
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn forms_router(state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/forms", get(list_forms).post(create_form))
            .route("/forms/{id}", get(get_form).patch(update_form).delete(delete_form))
            .route("/forms/{id}/archive", post(archive_form))
            .route("/forms/{id}/publish", post(publish_form))
            .with_state(state)
    }

    fn token(id: crate::types::UserId) -> String {
        create_session_token(
            &CurrentUser {
                id,
                email: "owner@example.org".to_string(),
            },
            &test_config(),
        )
        .unwrap()
    }

    fn volunteer_form(title: &str) -> Value {
        json!({
            "title": title,
            "fields": [
                {"id": "name", "type": "text", "label": "Name", "required": true},
                {"id": "shift", "type": "select", "label": "Shift", "options": ["Morning", "Evening"]}
            ]
        })
    }

    #[tokio::test]
    async fn test_invalid_definition_rejected_before_storage() {
        let server = TestServer::new(forms_router(test_state(lazy_pool()))).unwrap();
        let token = token(uuid::Uuid::new_v4());

        let response = server
            .post("/forms")
            .authorization_bearer(&token)
            .json(&json!({"title": "Intake", "fields": [{"id": "a", "type": "radio", "label": "Pick"}]}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["message"], "Field 'Pick' needs at least one option");

        server
            .post("/forms")
            .authorization_bearer(&token)
            .json(&json!({"title": "  "}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_forms_require_session() {
        let server = TestServer::new(forms_router(test_state(lazy_pool()))).unwrap();
        server.get("/forms").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/forms")
            .json(&volunteer_form("Intake"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_free_plan_form_limit(pool: PgPool) {
        let user_id = create_test_account(&pool, "limits@example.org").await;
        let token = token(user_id);
        let server = TestServer::new(forms_router(test_state(pool))).unwrap();

        let mut ids = Vec::new();
        for i in 0..3 {
            let response = server
                .post("/forms")
                .authorization_bearer(&token)
                .json(&volunteer_form(&format!("Form {i}")))
                .await;
            response.assert_status(StatusCode::CREATED);
            ids.push(response.json::<FormResponse>().id);
        }

        server
            .post("/forms")
            .authorization_bearer(&token)
            .json(&volunteer_form("One too many"))
            .await
            .assert_status(StatusCode::PAYMENT_REQUIRED);

        // Archiving frees a slot, and restoring is refused while the slot is taken
        server
            .post(&format!("/forms/{}/archive", ids[0]))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
        server
            .post("/forms")
            .authorization_bearer(&token)
            .json(&volunteer_form("Replacement"))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(&format!("/forms/{}/archive", ids[0]))
            .add_query_param("value", false)
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::PAYMENT_REQUIRED);

        let listed: Vec<FormResponse> = server.get("/forms").authorization_bearer(&token).await.json();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].title, "Replacement");

        let all: Vec<FormResponse> = server
            .get("/forms")
            .add_query_param("include_archived", true)
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(all.len(), 4);
    }

    #[sqlx::test]
    async fn test_file_fields_follow_file_uploads_feature(pool: PgPool) {
        let user_id = create_test_account(&pool, "uploads@example.org").await;
        let token = token(user_id);
        let server = TestServer::new(forms_router(test_state(pool.clone()))).unwrap();
        let application = json!({
            "title": "Volunteer application",
            "fields": [
                {"id": "name", "type": "text", "label": "Name"},
                {"id": "cv", "type": "file", "label": "CV"}
            ]
        });

        let response = server.post("/forms").authorization_bearer(&token).json(&application).await;
        response.assert_status(StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            response.json::<Value>()["message"],
            "File upload fields are not included in the Free plan"
        );

        let form: FormResponse = server
            .post("/forms")
            .authorization_bearer(&token)
            .json(&volunteer_form("Volunteer application"))
            .await
            .json();
        server
            .patch(&format!("/forms/{}", form.id))
            .authorization_bearer(&token)
            .json(&json!({"fields": application["fields"]}))
            .await
            .assert_status(StatusCode::PAYMENT_REQUIRED);
        // Edits that leave the fields alone are not gated
        server
            .patch(&format!("/forms/{}", form.id))
            .authorization_bearer(&token)
            .json(&json!({"title": "Volunteer sign-up"}))
            .await
            .assert_status_ok();

        let mut conn = pool.acquire().await.unwrap();
        Subscriptions::new(&mut conn)
            .apply_state(
                user_id,
                &SubscriptionStateUpdate {
                    plan: Plan::Starter,
                    billing_cycle: Some(BillingCycle::Monthly),
                    status: SubscriptionStatus::Active,
                    stripe_subscription_id: Some("sub_1".to_string()),
                    current_period_start: None,
                    current_period_end: None,
                    cancel_at_period_end: false,
                },
            )
            .await
            .unwrap();

        server
            .post("/forms")
            .authorization_bearer(&token)
            .json(&application)
            .await
            .assert_status(StatusCode::CREATED);
        server
            .patch(&format!("/forms/{}", form.id))
            .authorization_bearer(&token)
            .json(&json!({"fields": application["fields"]}))
            .await
            .assert_status_ok();
    }

    #[sqlx::test]
    async fn test_update_publish_and_tenant_isolation(pool: PgPool) {
        let owner = create_test_account(&pool, "owner@example.org").await;
        let other = create_test_account(&pool, "other@example.org").await;
        let server = TestServer::new(forms_router(test_state(pool))).unwrap();

        let form: FormResponse = server
            .post("/forms")
            .authorization_bearer(&token(owner))
            .json(&volunteer_form("Intake"))
            .await
            .json();
        assert!(!form.is_published);

        let published: FormResponse = server
            .post(&format!("/forms/{}/publish", form.id))
            .authorization_bearer(&token(owner))
            .await
            .json();
        assert!(published.is_published);

        let updated: FormResponse = server
            .patch(&format!("/forms/{}", form.id))
            .authorization_bearer(&token(owner))
            .json(&json!({"title": "Volunteer intake", "description": "Spring drive"}))
            .await
            .json();
        assert_eq!(updated.title, "Volunteer intake");
        assert_eq!(updated.description.as_deref(), Some("Spring drive"));
        assert_eq!(updated.fields.len(), 2);

        server
            .patch(&format!("/forms/{}", form.id))
            .authorization_bearer(&token(owner))
            .json(&json!({"fields": [{"id": "a", "type": "text", "label": "A"}, {"id": "a", "type": "text", "label": "B"}]}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .get(&format!("/forms/{}", form.id))
            .authorization_bearer(&token(other))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/forms/{}", form.id))
            .authorization_bearer(&token(other))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .delete(&format!("/forms/{}", form.id))
            .authorization_bearer(&token(owner))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}

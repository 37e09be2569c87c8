use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};

use super::forms::owned_form;
use crate::{
    AppState,
    api::models::{
        forms::PublicFormResponse,
        pagination::Pagination,
        submissions::{DEFAULT_SUCCESS_MESSAGE, SubmissionAccepted, SubmissionCreate, SubmissionResponse},
        users::CurrentUser,
    },
    db::{
        handlers::{Forms, Submissions, Subscriptions},
        models::{forms::FormDBResponse, submissions::SubmissionCreateDBRequest},
    },
    errors::{Error, Result},
    forms::validate_submission,
    types::{FormId, SubmissionId, abbrev_uuid},
    usage::{check_response_limit, responses_this_month},
    validation::require_email,
};

/// Client address as reported by the fronting proxy
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);
    let real_ip = || headers.get("x-real-ip").and_then(|v| v.to_str().ok()).map(str::trim);

    forwarded.or_else(real_ip).filter(|ip| !ip.is_empty()).map(str::to_string)
}

fn published_form_not_found(id: FormId) -> Error {
    Error::NotFound {
        resource: "Form".to_string(),
        id: id.to_string(),
    }
}

async fn published_form(state: &AppState, id: FormId) -> Result<FormDBResponse> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Forms::new(&mut pool_conn)
        .get_published(id)
        .await?
        .ok_or_else(|| published_form_not_found(id))
}

#[utoipa::path(
    get,
    path = "/forms/{id}/submissions",
    tag = "submissions",
    summary = "List a form's submissions",
    params(("id" = uuid::Uuid, Path, description = "Form ID"), Pagination),
    responses(
        (status = 200, description = "Submissions, newest first", body = Vec<SubmissionResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Form not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_submissions(
    State(state): State<AppState>,
    Path(form_id): Path<FormId>,
    Query(pagination): Query<Pagination>,
    current_user: CurrentUser,
) -> Result<Json<Vec<SubmissionResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_form(&mut pool_conn, form_id, &current_user).await?;

    let (skip, limit) = pagination.params();
    let submissions = Submissions::new(&mut pool_conn).list_for_form(form_id, skip, limit).await?;
    Ok(Json(submissions.into_iter().map(SubmissionResponse::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/submissions/{id}",
    tag = "submissions",
    summary = "Delete submission",
    params(("id" = uuid::Uuid, Path, description = "Submission ID")),
    responses(
        (status = 204, description = "Submission deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Submission not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<SubmissionId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let not_found = || Error::NotFound {
        resource: "Submission".to_string(),
        id: id.to_string(),
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let submission = Submissions::new(&mut tx).get_by_id(id).await?.ok_or_else(not_found)?;
    // Ownership is through the parent form
    owned_form(&mut tx, submission.form_id, &current_user)
        .await
        .map_err(|_| not_found())?;

    if !Submissions::new(&mut tx).delete(id).await? {
        return Err(not_found());
    }
    Forms::new(&mut tx).decrement_response_count(submission.form_id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}

/// A published form's definition, for respondents
#[utoipa::path(
    get,
    path = "/public/forms/{id}",
    tag = "public",
    summary = "Get published form",
    params(("id" = uuid::Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Form definition", body = PublicFormResponse),
        (status = 404, description = "No published form with this ID"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_public_form(State(state): State<AppState>, Path(id): Path<FormId>) -> Result<Json<PublicFormResponse>> {
    let form = published_form(&state, id).await?;
    Ok(Json(form.into()))
}

/// Submit a response to a published form
#[utoipa::path(
    post,
    path = "/public/forms/{id}/submissions",
    tag = "public",
    summary = "Submit response",
    request_body = SubmissionCreate,
    params(("id" = uuid::Uuid, Path, description = "Form ID")),
    responses(
        (status = 201, description = "Submission stored", body = SubmissionAccepted),
        (status = 400, description = "Answers do not match the form"),
        (status = 402, description = "The form's organization reached its monthly response limit"),
        (status = 404, description = "No published form with this ID"),
        (status = 409, description = "This email has already responded"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_public_form(
    State(state): State<AppState>,
    Path(id): Path<FormId>,
    headers: HeaderMap,
    Json(submission): Json<SubmissionCreate>,
) -> Result<(StatusCode, Json<SubmissionAccepted>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let form = Forms::new(&mut pool_conn)
        .get_published(id)
        .await?
        .ok_or_else(|| published_form_not_found(id))?;

    let plan = Subscriptions::new(&mut pool_conn).effective_plan(form.user_id).await?;
    check_response_limit(plan, responses_this_month(&mut pool_conn, form.user_id).await?)?;

    let data = validate_submission(&form.fields.0, &submission.data)?;

    let respondent_email = submission
        .respondent_email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    if let Some(email) = &respondent_email {
        require_email(email)?;
        if !form.settings.0.allows_multiple_submissions() && Submissions::new(&mut pool_conn).exists_with_email(id, email).await? {
            return Err(Error::Conflict {
                message: "A response from this email address has already been received".to_string(),
            });
        }
    }
    drop(pool_conn);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let stored = Submissions::new(&mut tx)
        .create(&SubmissionCreateDBRequest {
            form_id: id,
            data,
            respondent_email,
            ip_address: client_ip(&headers),
        })
        .await?;
    Forms::new(&mut tx).increment_response_count(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::debug!("Stored submission {}", abbrev_uuid(&stored.id));

    let message = form
        .settings
        .0
        .success_message
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());

    Ok((StatusCode::CREATED, Json(SubmissionAccepted { id: stored.id, message })))
}

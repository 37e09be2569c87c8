use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use super::forms::owned_form;
use crate::{
    AppState,
    api::models::{
        submissions::{FormReportResponse, OverviewEntry},
        users::CurrentUser,
    },
    db::handlers::{Submissions, Subscriptions},
    errors::{Error, Result},
    plans::{Feature, is_feature_available},
    reports::{export_filename, summarize_form, to_csv},
    types::FormId,
};

/// Per-field summaries over every submission to a form
#[utoipa::path(
    get,
    path = "/forms/{id}/report",
    tag = "reports",
    summary = "Form report",
    params(("id" = uuid::Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Field summaries", body = FormReportResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Form not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_form_report(
    State(state): State<AppState>,
    Path(id): Path<FormId>,
    current_user: CurrentUser,
) -> Result<Json<FormReportResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let form = owned_form(&mut pool_conn, id, &current_user).await?;
    let submissions = Submissions::new(&mut pool_conn).all_for_form(id).await?;

    let rows: Vec<_> = submissions.iter().map(|s| &s.data.0).collect();
    Ok(Json(FormReportResponse {
        form_id: form.id,
        title: form.title,
        total_submissions: rows.len(),
        fields: summarize_form(&form.fields.0, &rows),
    }))
}

/// Download a form's submissions as CSV
#[utoipa::path(
    get,
    path = "/forms/{id}/export",
    tag = "reports",
    summary = "Export submissions",
    params(("id" = uuid::Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "CSV export is not included in the plan"),
        (status = 404, description = "Form not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn export_submissions(State(state): State<AppState>, Path(id): Path<FormId>, current_user: CurrentUser) -> Result<Response> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let form = owned_form(&mut pool_conn, id, &current_user).await?;

    let plan = Subscriptions::new(&mut pool_conn).effective_plan(current_user.id).await?;
    if !is_feature_available(plan, Feature::CsvExport) {
        return Err(Error::PlanLimitExceeded {
            message: format!("CSV export is not included in the {} plan", plan.name()),
        });
    }

    let submissions = Submissions::new(&mut pool_conn).all_for_form(id).await?;
    let rows: Vec<_> = submissions.iter().map(|s| &s.data.0).collect();
    let csv = to_csv(&form.fields.0, &rows);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export_filename(&form.title)),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Submission counts per active form
#[utoipa::path(
    get,
    path = "/reports/overview",
    tag = "reports",
    summary = "Submissions overview",
    responses(
        (status = 200, description = "One entry per non-archived form", body = Vec<OverviewEntry>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_overview(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<OverviewEntry>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let counts = Submissions::new(&mut pool_conn).counts_by_form(current_user.id).await?;
    Ok(Json(counts.into_iter().map(OverviewEntry::from).collect()))
}

use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        settings::{OrganizationSettingsResponse, OrganizationSettingsUpdate},
        users::CurrentUser,
    },
    db::{
        handlers::{OrganizationSettings, Subscriptions},
        models::organization_settings::OrganizationSettingsUpdateDBRequest,
    },
    errors::{Error, Result},
    plans::{Feature, is_feature_available},
    validation::{is_hex_color, is_http_url, require_email},
};

fn check_update(request: &OrganizationSettingsUpdateDBRequest) -> Result<()> {
    if let Some(color) = &request.primary_color
        && !is_hex_color(color)
    {
        return Err(Error::BadRequest {
            message: "Primary color must be a hex colour like #4f46e5".to_string(),
        });
    }
    for (label, url) in [("Website", &request.website), ("Logo URL", &request.logo_url)] {
        if let Some(Some(url)) = url
            && !is_http_url(url)
        {
            return Err(Error::BadRequest {
                message: format!("{label} must be an absolute http(s) URL"),
            });
        }
    }
    if let Some(Some(email)) = &request.contact_email {
        require_email(email)?;
    }
    Ok(())
}

/// Branding and contact details; created with defaults on first read
#[utoipa::path(
    get,
    path = "/settings/organization",
    tag = "settings",
    summary = "Get organization settings",
    responses(
        (status = 200, description = "Current settings", body = OrganizationSettingsResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_settings(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<OrganizationSettingsResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = OrganizationSettings::new(&mut pool_conn);
    let settings = match repo.get_by_user(current_user.id).await? {
        Some(settings) => settings,
        None => repo.create_default(current_user.id, None).await?,
    };
    Ok(Json(settings.into()))
}

#[utoipa::path(
    patch,
    path = "/settings/organization",
    tag = "settings",
    summary = "Update organization settings",
    request_body = OrganizationSettingsUpdate,
    responses(
        (status = 200, description = "Updated settings", body = OrganizationSettingsResponse),
        (status = 400, description = "Invalid colour, URL or email"),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "Custom logo requires a plan with custom branding"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_settings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(update): Json<OrganizationSettingsUpdate>,
) -> Result<Json<OrganizationSettingsResponse>> {
    let sets_logo = update.sets_logo();
    let request = OrganizationSettingsUpdateDBRequest::from(update);
    check_update(&request)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    if sets_logo {
        let plan = Subscriptions::new(&mut tx).effective_plan(current_user.id).await?;
        if !is_feature_available(plan, Feature::CustomBranding) {
            return Err(Error::PlanLimitExceeded {
                message: format!("Custom branding is not included in the {} plan", plan.name()),
            });
        }
    }

    let mut repo = OrganizationSettings::new(&mut tx);
    if repo.get_by_user(current_user.id).await?.is_none() {
        repo.create_default(current_user.id, None).await?;
    }
    let settings = repo.update(current_user.id, &request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(settings.into()))
}

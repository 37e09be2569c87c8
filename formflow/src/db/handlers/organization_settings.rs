//! Database repository for per-account organization settings.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::models::organization_settings::{
    DEFAULT_PRIMARY_COLOR, OrganizationSettingsDBResponse, OrganizationSettingsUpdateDBRequest,
};
use crate::types::{UserId, abbrev_uuid};

pub struct OrganizationSettings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> OrganizationSettings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, organization_name), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn create_default(&mut self, user_id: UserId, organization_name: Option<&str>) -> Result<OrganizationSettingsDBResponse> {
        let settings = sqlx::query_as::<_, OrganizationSettingsDBResponse>(
            r#"
            INSERT INTO organization_settings (user_id, organization_name, primary_color)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(organization_name)
        .bind(DEFAULT_PRIMARY_COLOR)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(settings)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user(&mut self, user_id: UserId) -> Result<Option<OrganizationSettingsDBResponse>> {
        let settings = sqlx::query_as::<_, OrganizationSettingsDBResponse>("SELECT * FROM organization_settings WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(settings)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn update(&mut self, user_id: UserId, request: &OrganizationSettingsUpdateDBRequest) -> Result<OrganizationSettingsDBResponse> {
        let settings = sqlx::query_as::<_, OrganizationSettingsDBResponse>(
            r#"
            UPDATE organization_settings SET
                organization_name = CASE WHEN $2::boolean THEN $3 ELSE organization_name END,
                logo_url = CASE WHEN $4::boolean THEN $5 ELSE logo_url END,
                primary_color = COALESCE($6, primary_color),
                contact_email = CASE WHEN $7::boolean THEN $8 ELSE contact_email END,
                website = CASE WHEN $9::boolean THEN $10 ELSE website END,
                mission_statement = CASE WHEN $11::boolean THEN $12 ELSE mission_statement END
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(request.organization_name.is_some())
        .bind(request.organization_name.clone().flatten())
        .bind(request.logo_url.is_some())
        .bind(request.logo_url.clone().flatten())
        .bind(&request.primary_color)
        .bind(request.contact_email.is_some())
        .bind(request.contact_email.clone().flatten())
        .bind(request.website.is_some())
        .bind(request.website.clone().flatten())
        .bind(request.mission_statement.is_some())
        .bind(request.mission_statement.clone().flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(settings)
    }
}

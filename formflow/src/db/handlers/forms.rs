//! Database repository for forms.

use sqlx::{PgConnection, types::Json};
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::forms::{FormCreateDBRequest, FormDBResponse, FormUpdateDBRequest};
use crate::types::{FormId, UserId, abbrev_uuid};

/// Filter for listing forms
#[derive(Debug, Clone)]
pub struct FormFilter {
    pub user_id: UserId,
    pub include_archived: bool,
    pub skip: i64,
    pub limit: i64,
}

impl FormFilter {
    pub fn new(user_id: UserId, skip: i64, limit: i64) -> Self {
        Self {
            user_id,
            include_archived: false,
            skip,
            limit,
        }
    }

    pub fn with_archived(mut self, include_archived: bool) -> Self {
        self.include_archived = include_archived;
        self
    }
}

pub struct Forms<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Forms<'c> {
    type CreateRequest = FormCreateDBRequest;
    type UpdateRequest = FormUpdateDBRequest;
    type Response = FormDBResponse;
    type Id = FormId;
    type Filter = FormFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), fields = request.fields.len()), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let form = sqlx::query_as::<_, FormDBResponse>(
            r#"
            INSERT INTO forms (user_id, title, description, fields, settings)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.title.trim())
        .bind(&request.description)
        .bind(Json(&request.fields))
        .bind(Json(&request.settings))
        .fetch_one(&mut *self.db)
        .await?;

        Ok(form)
    }

    #[instrument(skip(self), fields(form_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let form = sqlx::query_as::<_, FormDBResponse>("SELECT * FROM forms WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(form)
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id), limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let forms = sqlx::query_as::<_, FormDBResponse>(
            r#"
            SELECT * FROM forms
            WHERE user_id = $1 AND ($2 OR NOT is_archived)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.include_archived)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(forms)
    }

    #[instrument(skip(self), fields(form_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(form_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let form = sqlx::query_as::<_, FormDBResponse>(
            r#"
            UPDATE forms SET
                title = COALESCE($2, title),
                description = CASE WHEN $3::boolean THEN $4 ELSE description END,
                fields = COALESCE($5, fields),
                settings = COALESCE($6, settings),
                is_published = COALESCE($7, is_published),
                is_archived = COALESCE($8, is_archived)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(request.description.is_some())
        .bind(request.description.clone().flatten())
        .bind(request.fields.as_ref().map(Json))
        .bind(request.settings.as_ref().map(Json))
        .bind(request.is_published)
        .bind(request.is_archived)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(form)
    }
}

impl<'c> Forms<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Non-archived forms owned by the user; the figure form limits are checked against
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count_active(&mut self, user_id: UserId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM forms WHERE user_id = $1 AND NOT is_archived")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// Sum of `response_count` over the user's non-archived forms
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn total_responses(&mut self, user_id: UserId) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(response_count), 0)::BIGINT FROM forms WHERE user_id = $1 AND NOT is_archived",
        )
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(total)
    }

    /// A form anyone may see and submit to
    #[instrument(skip(self), fields(form_id = %abbrev_uuid(&id)), err)]
    pub async fn get_published(&mut self, id: FormId) -> Result<Option<FormDBResponse>> {
        let form = sqlx::query_as::<_, FormDBResponse>("SELECT * FROM forms WHERE id = $1 AND is_published AND NOT is_archived")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(form)
    }

    #[instrument(skip(self), fields(form_id = %abbrev_uuid(&id)), err)]
    pub async fn increment_response_count(&mut self, id: FormId) -> Result<()> {
        let result = sqlx::query("UPDATE forms SET response_count = response_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Floors at zero so a stale counter never trips the check constraint
    #[instrument(skip(self), fields(form_id = %abbrev_uuid(&id)), err)]
    pub async fn decrement_response_count(&mut self, id: FormId) -> Result<()> {
        sqlx::query("UPDATE forms SET response_count = GREATEST(response_count - 1, 0) WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }
}

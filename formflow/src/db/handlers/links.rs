//! Database repository for saved links.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::links::{LinkCreateDBRequest, LinkDBResponse, LinkUpdateDBRequest};
use crate::types::{LinkId, UserId, abbrev_uuid};

/// Filter for listing links
#[derive(Debug, Clone)]
pub struct LinkFilter {
    pub user_id: UserId,
    pub skip: i64,
    pub limit: i64,
}

impl LinkFilter {
    pub fn new(user_id: UserId, skip: i64, limit: i64) -> Self {
        Self { user_id, skip, limit }
    }
}

pub struct Links<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Links<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count(&mut self, user_id: UserId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM links WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Links<'c> {
    type CreateRequest = LinkCreateDBRequest;
    type UpdateRequest = LinkUpdateDBRequest;
    type Response = LinkDBResponse;
    type Id = LinkId;
    type Filter = LinkFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let link = sqlx::query_as::<_, LinkDBResponse>(
            r#"
            INSERT INTO links (user_id, title, url, description, category, folder, icon)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.title)
        .bind(&request.url)
        .bind(&request.description)
        .bind(&request.category)
        .bind(&request.folder)
        .bind(&request.icon)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(link)
    }

    #[instrument(skip(self), fields(link_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let link = sqlx::query_as::<_, LinkDBResponse>("SELECT * FROM links WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(link)
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id), limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let links = sqlx::query_as::<_, LinkDBResponse>(
            "SELECT * FROM links WHERE user_id = $1 ORDER BY created_at DESC OFFSET $2 LIMIT $3",
        )
        .bind(filter.user_id)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(links)
    }

    #[instrument(skip(self), fields(link_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(link_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let link = sqlx::query_as::<_, LinkDBResponse>(
            r#"
            UPDATE links SET
                title = COALESCE($2, title),
                url = COALESCE($3, url),
                description = CASE WHEN $4::boolean THEN $5 ELSE description END,
                category = CASE WHEN $6::boolean THEN $7 ELSE category END,
                folder = CASE WHEN $8::boolean THEN $9 ELSE folder END,
                icon = CASE WHEN $10::boolean THEN $11 ELSE icon END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.url)
        .bind(request.description.is_some())
        .bind(request.description.clone().flatten())
        .bind(request.category.is_some())
        .bind(request.category.clone().flatten())
        .bind(request.folder.is_some())
        .bind(request.folder.clone().flatten())
        .bind(request.icon.is_some())
        .bind(request.icon.clone().flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(link)
    }
}

//! Database repository for inventory items.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::inventory::{InventoryItemCreateDBRequest, InventoryItemDBResponse, InventoryItemUpdateDBRequest};
use crate::types::{InventoryItemId, UserId, abbrev_uuid};

/// Filter for listing inventory items
#[derive(Debug, Clone)]
pub struct InventoryFilter {
    pub user_id: UserId,
    pub category: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

impl InventoryFilter {
    pub fn new(user_id: UserId, skip: i64, limit: i64) -> Self {
        Self {
            user_id,
            category: None,
            skip,
            limit,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

pub struct InventoryItems<'c> {
    db: &'c mut PgConnection,
}

impl<'c> InventoryItems<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count(&mut self, user_id: UserId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inventory_items WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for InventoryItems<'c> {
    type CreateRequest = InventoryItemCreateDBRequest;
    type UpdateRequest = InventoryItemUpdateDBRequest;
    type Response = InventoryItemDBResponse;
    type Id = InventoryItemId;
    type Filter = InventoryFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), quantity = request.quantity), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let item = sqlx::query_as::<_, InventoryItemDBResponse>(
            r#"
            INSERT INTO inventory_items (user_id, name, description, quantity, unit, category, condition, location, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.quantity)
        .bind(&request.unit)
        .bind(&request.category)
        .bind(request.condition)
        .bind(&request.location)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let item = sqlx::query_as::<_, InventoryItemDBResponse>("SELECT * FROM inventory_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(item)
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id), limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let items = sqlx::query_as::<_, InventoryItemDBResponse>(
            r#"
            SELECT * FROM inventory_items
            WHERE user_id = $1 AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(filter.user_id)
        .bind(&filter.category)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(items)
    }

    #[instrument(skip(self), fields(item_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(item_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let item = sqlx::query_as::<_, InventoryItemDBResponse>(
            r#"
            UPDATE inventory_items SET
                name = COALESCE($2, name),
                description = CASE WHEN $3::boolean THEN $4 ELSE description END,
                quantity = COALESCE($5, quantity),
                unit = CASE WHEN $6::boolean THEN $7 ELSE unit END,
                category = CASE WHEN $8::boolean THEN $9 ELSE category END,
                condition = CASE WHEN $10::boolean THEN $11 ELSE condition END,
                location = CASE WHEN $12::boolean THEN $13 ELSE location END,
                notes = CASE WHEN $14::boolean THEN $15 ELSE notes END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name.as_deref().map(str::trim))
        .bind(request.description.is_some())
        .bind(request.description.clone().flatten())
        .bind(request.quantity)
        .bind(request.unit.is_some())
        .bind(request.unit.clone().flatten())
        .bind(request.category.is_some())
        .bind(request.category.clone().flatten())
        .bind(request.condition.is_some())
        .bind(request.condition.flatten())
        .bind(request.location.is_some())
        .bind(request.location.clone().flatten())
        .bind(request.notes.is_some())
        .bind(request.notes.clone().flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(item)
    }
}

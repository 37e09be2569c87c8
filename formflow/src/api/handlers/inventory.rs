use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::PgConnection;

use crate::{
    AppState,
    api::models::{
        inventory::{InventoryItemCreate, InventoryItemResponse, InventoryItemUpdate, ListInventoryQuery},
        users::{CurrentUser, trimmed},
    },
    db::{
        handlers::{InventoryItems, Repository, inventory::InventoryFilter},
        models::inventory::{InventoryItemDBResponse, InventoryItemUpdateDBRequest},
    },
    errors::{Error, Result},
    types::InventoryItemId,
};

fn item_not_found(id: InventoryItemId) -> Error {
    Error::NotFound {
        resource: "Inventory item".to_string(),
        id: id.to_string(),
    }
}

fn check_item(name: Option<&str>, quantity: Option<i32>) -> Result<()> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(Error::BadRequest {
            message: "Item name cannot be empty".to_string(),
        });
    }
    if quantity.is_some_and(|q| q < 0) {
        return Err(Error::BadRequest {
            message: "Quantity cannot be negative".to_string(),
        });
    }
    Ok(())
}

async fn owned_item(conn: &mut PgConnection, id: InventoryItemId, current_user: &CurrentUser) -> Result<InventoryItemDBResponse> {
    InventoryItems::new(conn)
        .get_by_id(id)
        .await?
        .filter(|item| item.user_id == current_user.id)
        .ok_or_else(|| item_not_found(id))
}

#[utoipa::path(
    get,
    path = "/inventory",
    tag = "inventory",
    summary = "List inventory",
    params(ListInventoryQuery),
    responses(
        (status = 200, description = "Items, newest first", body = Vec<InventoryItemResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<ListInventoryQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<InventoryItemResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = InventoryFilter::new(current_user.id, skip, limit).with_category(trimmed(query.category));

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let items = InventoryItems::new(&mut pool_conn).list(&filter).await?;
    Ok(Json(items.into_iter().map(InventoryItemResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/inventory",
    tag = "inventory",
    summary = "Add inventory item",
    request_body = InventoryItemCreate,
    responses(
        (status = 201, description = "Item created", body = InventoryItemResponse),
        (status = 400, description = "Missing name or negative quantity"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<InventoryItemCreate>,
) -> Result<(StatusCode, Json<InventoryItemResponse>)> {
    check_item(Some(&create.name), Some(create.quantity))?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let item = InventoryItems::new(&mut pool_conn)
        .create(&create.into_db_request(current_user.id))
        .await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[utoipa::path(
    get,
    path = "/inventory/{id}",
    tag = "inventory",
    summary = "Get inventory item",
    params(("id" = uuid::Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item", body = InventoryItemResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Item not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<InventoryItemId>,
    current_user: CurrentUser,
) -> Result<Json<InventoryItemResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Ok(Json(owned_item(&mut pool_conn, id, &current_user).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/inventory/{id}",
    tag = "inventory",
    summary = "Update inventory item",
    request_body = InventoryItemUpdate,
    params(("id" = uuid::Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Updated item", body = InventoryItemResponse),
        (status = 400, description = "Empty name or negative quantity"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Item not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<InventoryItemId>,
    current_user: CurrentUser,
    Json(update): Json<InventoryItemUpdate>,
) -> Result<Json<InventoryItemResponse>> {
    let request = InventoryItemUpdateDBRequest::from(update);
    check_item(request.name.as_deref(), request.quantity)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_item(&mut pool_conn, id, &current_user).await?;
    let item = InventoryItems::new(&mut pool_conn).update(id, &request).await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    delete,
    path = "/inventory/{id}",
    tag = "inventory",
    summary = "Delete inventory item",
    params(("id" = uuid::Uuid, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Item not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<InventoryItemId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_item(&mut pool_conn, id, &current_user).await?;
    if !InventoryItems::new(&mut pool_conn).delete(id).await? {
        return Err(item_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

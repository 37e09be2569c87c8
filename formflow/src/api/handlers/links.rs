use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::PgConnection;

use crate::{
    AppState,
    api::models::{
        links::{LinkCreate, LinkGroup, LinkResponse, LinkUpdate, group_by_category},
        pagination::{MAX_LIMIT, Pagination},
        users::CurrentUser,
    },
    db::{
        handlers::{Links, Repository, links::LinkFilter},
        models::links::{LinkDBResponse, LinkUpdateDBRequest},
    },
    errors::{Error, Result},
    types::LinkId,
    validation::is_http_url,
};

fn link_not_found(id: LinkId) -> Error {
    Error::NotFound {
        resource: "Link".to_string(),
        id: id.to_string(),
    }
}

fn check_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Link title cannot be empty".to_string(),
        });
    }
    Ok(())
}

fn check_url(url: &str) -> Result<()> {
    if !is_http_url(url.trim()) {
        return Err(Error::BadRequest {
            message: "Link URL must be an absolute http(s) URL".to_string(),
        });
    }
    Ok(())
}

async fn owned_link(conn: &mut PgConnection, id: LinkId, current_user: &CurrentUser) -> Result<LinkDBResponse> {
    Links::new(conn)
        .get_by_id(id)
        .await?
        .filter(|link| link.user_id == current_user.id)
        .ok_or_else(|| link_not_found(id))
}

#[utoipa::path(
    get,
    path = "/links",
    tag = "links",
    summary = "List links",
    params(Pagination),
    responses(
        (status = 200, description = "Saved links, newest first", body = Vec<LinkResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_links(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    current_user: CurrentUser,
) -> Result<Json<Vec<LinkResponse>>> {
    let (skip, limit) = pagination.params();
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let links = Links::new(&mut pool_conn).list(&LinkFilter::new(current_user.id, skip, limit)).await?;
    Ok(Json(links.into_iter().map(LinkResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/links/grouped",
    tag = "links",
    summary = "List links by category",
    responses(
        (status = 200, description = "Links grouped by category, `Uncategorized` for none", body = Vec<LinkGroup>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_links_grouped(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<LinkGroup>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let links = Links::new(&mut pool_conn)
        .list(&LinkFilter::new(current_user.id, 0, MAX_LIMIT))
        .await?;
    Ok(Json(group_by_category(links.into_iter().map(LinkResponse::from).collect())))
}

#[utoipa::path(
    post,
    path = "/links",
    tag = "links",
    summary = "Create link",
    request_body = LinkCreate,
    responses(
        (status = 201, description = "Link created", body = LinkResponse),
        (status = 400, description = "Invalid title or URL"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_link(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<LinkCreate>,
) -> Result<(StatusCode, Json<LinkResponse>)> {
    check_title(&create.title)?;
    check_url(&create.url)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let link = Links::new(&mut pool_conn).create(&create.into_db_request(current_user.id)).await?;
    Ok((StatusCode::CREATED, Json(link.into())))
}

#[utoipa::path(
    patch,
    path = "/links/{id}",
    tag = "links",
    summary = "Update link",
    request_body = LinkUpdate,
    params(("id" = uuid::Uuid, Path, description = "Link ID")),
    responses(
        (status = 200, description = "Updated link", body = LinkResponse),
        (status = 400, description = "Invalid title or URL"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Link not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_link(
    State(state): State<AppState>,
    Path(id): Path<LinkId>,
    current_user: CurrentUser,
    Json(update): Json<LinkUpdate>,
) -> Result<Json<LinkResponse>> {
    let request = LinkUpdateDBRequest::from(update);
    if let Some(title) = &request.title {
        check_title(title)?;
    }
    if let Some(url) = &request.url {
        check_url(url)?;
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_link(&mut pool_conn, id, &current_user).await?;
    let link = Links::new(&mut pool_conn).update(id, &request).await?;
    Ok(Json(link.into()))
}

#[utoipa::path(
    delete,
    path = "/links/{id}",
    tag = "links",
    summary = "Delete link",
    params(("id" = uuid::Uuid, Path, description = "Link ID")),
    responses(
        (status = 204, description = "Link deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Link not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_link(State(state): State<AppState>, Path(id): Path<LinkId>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_link(&mut pool_conn, id, &current_user).await?;
    if !Links::new(&mut pool_conn).delete(id).await? {
        return Err(link_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

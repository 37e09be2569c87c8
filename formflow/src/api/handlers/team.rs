use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sqlx::PgConnection;

use crate::{
    AppState,
    api::models::{
        team::{TeamInvite, TeamMemberResponse, TeamMemberUpdate},
        users::CurrentUser,
    },
    db::{
        handlers::{Subscriptions, TeamMembers},
        models::team_members::TeamMemberDBResponse,
    },
    errors::{Error, Result},
    types::{Operation, Resource, TeamMemberId},
    usage::{check_seat_limit, seats_in_use},
    validation::require_email,
};

fn member_not_found(id: TeamMemberId) -> Error {
    Error::NotFound {
        resource: "Team member".to_string(),
        id: id.to_string(),
    }
}

/// Invitations belong to the account that sent them; anyone else sees a 404.
async fn owned_member(conn: &mut PgConnection, id: TeamMemberId, current_user: &CurrentUser) -> Result<TeamMemberDBResponse> {
    TeamMembers::new(conn)
        .get_by_id(id)
        .await?
        .filter(|member| member.owner_id == current_user.id)
        .ok_or_else(|| member_not_found(id))
}

#[utoipa::path(
    get,
    path = "/team",
    tag = "team",
    summary = "List team",
    responses(
        (status = 200, description = "Invitations and members, newest first", body = Vec<TeamMemberResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_team(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<TeamMemberResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let members = TeamMembers::new(&mut pool_conn).list(current_user.id).await?;
    Ok(Json(members.into_iter().map(TeamMemberResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/team",
    tag = "team",
    summary = "Invite team member",
    request_body = TeamInvite,
    responses(
        (status = 201, description = "Invitation created", body = TeamMemberResponse),
        (status = 400, description = "Invalid email"),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "No seats left on the plan"),
        (status = 409, description = "Address already invited"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn invite_member(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(mut invite): Json<TeamInvite>,
) -> Result<(StatusCode, Json<TeamMemberResponse>)> {
    invite.email = invite.email.trim().to_lowercase();
    require_email(&invite.email)?;
    if invite.email == current_user.email.to_lowercase() {
        return Err(Error::BadRequest {
            message: "You cannot invite yourself".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let plan = Subscriptions::new(&mut tx).effective_plan(current_user.id).await?;
    check_seat_limit(plan, seats_in_use(&mut tx, current_user.id).await?)?;

    let member = TeamMembers::new(&mut tx).create(&invite.into_db_request(current_user.id)).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(member_id = %member.id, "Team invitation created");
    Ok((StatusCode::CREATED, Json(member.into())))
}

#[utoipa::path(
    patch,
    path = "/team/{id}",
    tag = "team",
    summary = "Change member role",
    request_body = TeamMemberUpdate,
    params(("id" = uuid::Uuid, Path, description = "Team member ID")),
    responses(
        (status = 200, description = "Updated member", body = TeamMemberResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Team member not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<TeamMemberId>,
    current_user: CurrentUser,
    Json(update): Json<TeamMemberUpdate>,
) -> Result<Json<TeamMemberResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_member(&mut pool_conn, id, &current_user).await?;
    let member = TeamMembers::new(&mut pool_conn).update_role(id, update.role).await?;
    Ok(Json(member.into()))
}

#[utoipa::path(
    delete,
    path = "/team/{id}",
    tag = "team",
    summary = "Remove member or revoke invitation",
    params(("id" = uuid::Uuid, Path, description = "Team member ID")),
    responses(
        (status = 204, description = "Removed; the seat is freed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Team member not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn remove_member(
    State(state): State<AppState>,
    Path(id): Path<TeamMemberId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_member(&mut pool_conn, id, &current_user).await?;
    if !TeamMembers::new(&mut pool_conn).delete(id).await? {
        return Err(member_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Accept an invitation addressed to the signed-in user's email
#[utoipa::path(
    post,
    path = "/team/{id}/accept",
    tag = "team",
    summary = "Accept invitation",
    params(("id" = uuid::Uuid, Path, description = "Invitation ID")),
    responses(
        (status = 200, description = "Membership is active", body = TeamMemberResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Invitation was sent to a different address"),
        (status = 404, description = "No pending invitation with this ID"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn accept_invitation(
    State(state): State<AppState>,
    Path(id): Path<TeamMemberId>,
    current_user: CurrentUser,
) -> Result<Json<TeamMemberResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = TeamMembers::new(&mut pool_conn);
    let invitation = repo.get_by_id(id).await?.ok_or_else(|| member_not_found(id))?;

    if !invitation.email.eq_ignore_ascii_case(&current_user.email) {
        return Err(Error::InsufficientPermissions {
            action: Operation::Update,
            resource: Resource::Team,
        });
    }

    let member = repo.accept(id, current_user.id).await?;
    Ok(Json(member.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::create_session_token;
    use crate::db::models::subscriptions::{SubscriptionStateUpdate, SubscriptionStatus};
    use crate::db::models::team_members::{TeamMemberStatus, TeamRole};
    use crate::plans::{BillingCycle, Plan};
    use crate::test_utils::{create_test_account, lazy_pool, test_config, test_state};
    use crate::types::UserId;
    use axum::routing::{get, patch, post};
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::PgPool;

    fn team_router(state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/team", get(list_team).post(invite_member))
            .route("/team/{id}", patch(update_member).delete(remove_member))
            .route("/team/{id}/accept", post(accept_invitation))
            .with_state(state)
    }

    fn token(id: UserId, email: &str) -> String {
        create_session_token(
            &CurrentUser {
                id,
                email: email.to_string(),
            },
            &test_config(),
        )
        .unwrap()
    }

    async fn upgrade(pool: &PgPool, user_id: UserId, plan: Plan) {
        let mut conn = pool.acquire().await.unwrap();
        Subscriptions::new(&mut conn)
            .apply_state(
                user_id,
                &SubscriptionStateUpdate {
                    plan,
                    billing_cycle: Some(BillingCycle::Monthly),
                    status: SubscriptionStatus::Active,
                    stripe_subscription_id: Some("sub_team".to_string()),
                    current_period_start: None,
                    current_period_end: None,
                    cancel_at_period_end: false,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invite_validation_before_database() {
        let server = TestServer::new(team_router(test_state(lazy_pool()))).unwrap();
        let owner = uuid::Uuid::new_v4();

        server
            .post("/team")
            .authorization_bearer(&token(owner, "owner@example.org"))
            .json(&json!({"email": "not-an-email"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .post("/team")
            .authorization_bearer(&token(owner, "owner@example.org"))
            .json(&json!({"email": " Owner@Example.org "}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server.get("/team").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_free_plan_has_no_spare_seats(pool: PgPool) {
        let owner = create_test_account(&pool, "owner@example.org").await;
        let server = TestServer::new(team_router(test_state(pool))).unwrap();

        server
            .post("/team")
            .authorization_bearer(&token(owner, "owner@example.org"))
            .json(&json!({"email": "helper@example.org"}))
            .await
            .assert_status(StatusCode::PAYMENT_REQUIRED);
    }

    #[sqlx::test]
    async fn test_invite_accept_and_seat_limit(pool: PgPool) {
        let owner = create_test_account(&pool, "owner@example.org").await;
        let helper = create_test_account(&pool, "helper@example.org").await;
        upgrade(&pool, owner, Plan::Starter).await;
        let server = TestServer::new(team_router(test_state(pool))).unwrap();
        let owner_token = token(owner, "owner@example.org");

        let invite: TeamMemberResponse = server
            .post("/team")
            .authorization_bearer(&owner_token)
            .json(&json!({"email": "Helper@Example.org", "role": "admin"}))
            .await
            .json();
        assert_eq!(invite.email, "helper@example.org");
        assert_eq!(invite.status, TeamMemberStatus::Pending);

        server
            .post("/team")
            .authorization_bearer(&owner_token)
            .json(&json!({"email": "helper@example.org"}))
            .await
            .assert_status(StatusCode::CONFLICT);

        server
            .post("/team")
            .authorization_bearer(&owner_token)
            .json(&json!({"email": "third@example.org"}))
            .await
            .assert_status(StatusCode::CREATED);
        // Owner plus two invitations fills the three Starter seats
        server
            .post("/team")
            .authorization_bearer(&owner_token)
            .json(&json!({"email": "fourth@example.org"}))
            .await
            .assert_status(StatusCode::PAYMENT_REQUIRED);

        server
            .post(&format!("/team/{}/accept", invite.id))
            .authorization_bearer(&token(owner, "owner@example.org"))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let accepted: TeamMemberResponse = server
            .post(&format!("/team/{}/accept", invite.id))
            .authorization_bearer(&token(helper, "helper@example.org"))
            .await
            .json();
        assert_eq!(accepted.status, TeamMemberStatus::Active);
        assert_eq!(accepted.member_id, Some(helper));

        let updated: TeamMemberResponse = server
            .patch(&format!("/team/{}", invite.id))
            .authorization_bearer(&owner_token)
            .json(&json!({"role": "viewer"}))
            .await
            .json();
        assert_eq!(updated.role, TeamRole::Viewer);

        server
            .delete(&format!("/team/{}", invite.id))
            .authorization_bearer(&token(helper, "helper@example.org"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/team/{}", invite.id))
            .authorization_bearer(&owner_token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let team: Vec<TeamMemberResponse> = server.get("/team").authorization_bearer(&owner_token).await.json();
        assert_eq!(team.len(), 1);
    }
}

//! Database repository for team invitations and memberships.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::models::team_members::{TeamMemberCreateDBRequest, TeamMemberDBResponse, TeamMemberStatus, TeamRole};
use crate::types::{TeamMemberId, UserId, abbrev_uuid};

pub struct TeamMembers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> TeamMembers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Invite by email. A second invitation to the same address fails on
    /// `team_members_owner_email_unique`.
    #[instrument(skip(self, request), fields(owner_id = %abbrev_uuid(&request.owner_id), role = ?request.role), err)]
    pub async fn create(&mut self, request: &TeamMemberCreateDBRequest) -> Result<TeamMemberDBResponse> {
        let member = sqlx::query_as::<_, TeamMemberDBResponse>(
            r#"
            INSERT INTO team_members (owner_id, email, role, status)
            VALUES ($1, LOWER($2), $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.owner_id)
        .bind(request.email.trim())
        .bind(request.role)
        .bind(TeamMemberStatus::Pending)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(member)
    }

    #[instrument(skip(self), fields(member_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: TeamMemberId) -> Result<Option<TeamMemberDBResponse>> {
        let member = sqlx::query_as::<_, TeamMemberDBResponse>("SELECT * FROM team_members WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(member)
    }

    /// Newest invitation first
    #[instrument(skip(self), fields(owner_id = %abbrev_uuid(&owner_id)), err)]
    pub async fn list(&mut self, owner_id: UserId) -> Result<Vec<TeamMemberDBResponse>> {
        let members = sqlx::query_as::<_, TeamMemberDBResponse>("SELECT * FROM team_members WHERE owner_id = $1 ORDER BY invited_at DESC")
            .bind(owner_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(members)
    }

    /// Invitations and members, pending or not; each takes a seat
    #[instrument(skip(self), fields(owner_id = %abbrev_uuid(&owner_id)), err)]
    pub async fn count(&mut self, owner_id: UserId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM team_members WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(member_id = %abbrev_uuid(&id), role = ?role), err)]
    pub async fn update_role(&mut self, id: TeamMemberId, role: TeamRole) -> Result<TeamMemberDBResponse> {
        let member = sqlx::query_as::<_, TeamMemberDBResponse>("UPDATE team_members SET role = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(role)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(member)
    }

    /// Mark a pending invitation active for the user who accepted it
    #[instrument(skip(self), fields(member_id = %abbrev_uuid(&id), user_id = %abbrev_uuid(&member_id)), err)]
    pub async fn accept(&mut self, id: TeamMemberId, member_id: UserId) -> Result<TeamMemberDBResponse> {
        let member = sqlx::query_as::<_, TeamMemberDBResponse>(
            r#"
            UPDATE team_members SET status = $3, member_id = $2, joined_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(member_id)
        .bind(TeamMemberStatus::Active)
        .bind(TeamMemberStatus::Pending)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(member)
    }

    #[instrument(skip(self), fields(member_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: TeamMemberId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Users;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::PgPool;

    async fn create_user(conn: &mut PgConnection, email: &str) -> UserId {
        Users::new(conn)
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    async fn test_invite_accept_and_remove(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = create_user(&mut conn, "owner@example.org").await;
        let invitee = create_user(&mut conn, "helper@example.org").await;
        let mut repo = TeamMembers::new(&mut conn);

        let invite = repo
            .create(&TeamMemberCreateDBRequest {
                owner_id: owner,
                email: "Helper@Example.org".to_string(),
                role: TeamRole::default(),
            })
            .await
            .unwrap();
        assert_eq!(invite.email, "helper@example.org");
        assert_eq!(invite.status, TeamMemberStatus::Pending);
        assert_eq!(invite.role, TeamRole::Member);
        assert_eq!(repo.count(owner).await.unwrap(), 1);

        let accepted = repo.accept(invite.id, invitee).await.unwrap();
        assert_eq!(accepted.status, TeamMemberStatus::Active);
        assert_eq!(accepted.member_id, Some(invitee));
        assert!(accepted.joined_at.is_some());

        // Accepting twice finds no pending row
        assert!(matches!(repo.accept(invite.id, invitee).await.unwrap_err(), DbError::NotFound));

        let promoted = repo.update_role(invite.id, TeamRole::Admin).await.unwrap();
        assert_eq!(promoted.role, TeamRole::Admin);

        assert!(repo.delete(invite.id).await.unwrap());
        assert!(repo.list(owner).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn test_duplicate_invite_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = create_user(&mut conn, "owner@example.org").await;
        let mut repo = TeamMembers::new(&mut conn);

        let request = TeamMemberCreateDBRequest {
            owner_id: owner,
            email: "helper@example.org".to_string(),
            role: TeamRole::Viewer,
        };
        repo.create(&request).await.unwrap();
        let err = repo.create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}

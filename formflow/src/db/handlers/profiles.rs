//! Database repository for account profiles.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::models::profiles::{ProfileCreateDBRequest, ProfileDBResponse, ProfileUpdateDBRequest};
use crate::types::{UserId, abbrev_uuid};

pub struct Profiles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Profiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.id)), err)]
    pub async fn create(&mut self, request: &ProfileCreateDBRequest) -> Result<ProfileDBResponse> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(
            r#"
            INSERT INTO profiles (id, email, full_name, organization_name)
            VALUES ($1, LOWER($2), $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(&request.email)
        .bind(&request.full_name)
        .bind(&request.organization_name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(profile)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<ProfileDBResponse>> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(profile)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: UserId, request: &ProfileUpdateDBRequest) -> Result<ProfileDBResponse> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(
            r#"
            UPDATE profiles SET
                full_name = CASE WHEN $2::boolean THEN $3 ELSE full_name END,
                organization_name = CASE WHEN $4::boolean THEN $5 ELSE organization_name END,
                avatar_url = CASE WHEN $6::boolean THEN $7 ELSE avatar_url END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.full_name.is_some())
        .bind(request.full_name.clone().flatten())
        .bind(request.organization_name.is_some())
        .bind(request.organization_name.clone().flatten())
        .bind(request.avatar_url.is_some())
        .bind(request.avatar_url.clone().flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Users;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_partial_update_keeps_other_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                email: "ada@example.org".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        let mut repo = Profiles::new(&mut conn);
        repo.create(&ProfileCreateDBRequest {
            id: user.id,
            email: user.email.clone(),
            full_name: Some("Ada Lovelace".to_string()),
            organization_name: Some("Analytical Aid".to_string()),
        })
        .await
        .unwrap();

        let updated = repo
            .update(
                user.id,
                &ProfileUpdateDBRequest {
                    organization_name: Some(None),
                    avatar_url: Some(Some("https://example.org/ada.png".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(updated.organization_name, None);
        assert_eq!(updated.avatar_url.as_deref(), Some("https://example.org/ada.png"));
    }
}

//! Database repository for form submissions.
//!
//! Submissions are never listed without their form: ownership is checked on the form, so every
//! query here is keyed by a form id or joins through `forms.user_id`.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, types::Json};
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::submissions::{FormSubmissionCount, SubmissionCreateDBRequest, SubmissionDBResponse};
use crate::types::{FormId, SubmissionId, UserId, abbrev_uuid};

pub struct Submissions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Submissions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(form_id = %abbrev_uuid(&request.form_id)), err)]
    pub async fn create(&mut self, request: &SubmissionCreateDBRequest) -> Result<SubmissionDBResponse> {
        let submission = sqlx::query_as::<_, SubmissionDBResponse>(
            r#"
            INSERT INTO form_submissions (form_id, data, respondent_email, ip_address)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.form_id)
        .bind(Json(&request.data))
        .bind(&request.respondent_email)
        .bind(&request.ip_address)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(submission)
    }

    #[instrument(skip(self), fields(submission_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: SubmissionId) -> Result<Option<SubmissionDBResponse>> {
        let submission = sqlx::query_as::<_, SubmissionDBResponse>("SELECT * FROM form_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(submission)
    }

    /// Newest first
    #[instrument(skip(self), fields(form_id = %abbrev_uuid(&form_id)), err)]
    pub async fn list_for_form(&mut self, form_id: FormId, skip: i64, limit: i64) -> Result<Vec<SubmissionDBResponse>> {
        let submissions = sqlx::query_as::<_, SubmissionDBResponse>(
            r#"
            SELECT * FROM form_submissions
            WHERE form_id = $1
            ORDER BY submitted_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(form_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(submissions)
    }

    /// Every submission for a form, newest first, for reports and exports
    #[instrument(skip(self), fields(form_id = %abbrev_uuid(&form_id)), err)]
    pub async fn all_for_form(&mut self, form_id: FormId) -> Result<Vec<SubmissionDBResponse>> {
        let submissions =
            sqlx::query_as::<_, SubmissionDBResponse>("SELECT * FROM form_submissions WHERE form_id = $1 ORDER BY submitted_at DESC")
                .bind(form_id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(submissions)
    }

    #[instrument(skip(self), fields(submission_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: SubmissionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM form_submissions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Submissions received since `since` across every form the user owns
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&owner_id), since = %since), err)]
    pub async fn count_since_for_owner(&mut self, owner_id: UserId, since: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM form_submissions s
            JOIN forms f ON f.id = s.form_id
            WHERE f.user_id = $1 AND s.submitted_at >= $2
            "#,
        )
        .bind(owner_id)
        .bind(since)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    /// Whether this respondent email has already submitted to the form (case-insensitive)
    #[instrument(skip(self, email), fields(form_id = %abbrev_uuid(&form_id)), err)]
    pub async fn exists_with_email(&mut self, form_id: FormId, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM form_submissions WHERE form_id = $1 AND LOWER(respondent_email) = LOWER($2))",
        )
        .bind(form_id)
        .bind(email.trim())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    /// Submission counts per non-archived form, newest form first
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&owner_id)), err)]
    pub async fn counts_by_form(&mut self, owner_id: UserId) -> Result<Vec<FormSubmissionCount>> {
        let counts = sqlx::query_as::<_, FormSubmissionCount>(
            r#"
            SELECT f.id AS form_id, f.title, COUNT(s.id) AS submissions
            FROM forms f
            LEFT JOIN form_submissions s ON s.form_id = f.id
            WHERE f.user_id = $1 AND NOT f.is_archived
            GROUP BY f.id, f.title, f.created_at
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(counts)
    }
}

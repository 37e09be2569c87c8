//! Database repository for subscription rows.
//!
//! Each account has exactly one row, created on the free tier at registration. Plan, billing
//! cycle, status and billing period are only ever changed by [`Subscriptions::apply_state`] and
//! [`Subscriptions::set_status`], which the billing webhook handler calls.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::subscriptions::{SubscriptionDBResponse, SubscriptionStateUpdate, SubscriptionStatus};
use crate::plans::Plan;
use crate::types::{UserId, abbrev_uuid};

pub struct Subscriptions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Subscriptions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert the free/active row for a new account
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn create_default(&mut self, user_id: UserId) -> Result<SubscriptionDBResponse> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>(
            r#"
            INSERT INTO subscriptions (user_id, plan, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Plan::Free)
        .bind(SubscriptionStatus::Active)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(subscription)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user(&mut self, user_id: UserId) -> Result<Option<SubscriptionDBResponse>> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>("SELECT * FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(subscription)
    }

    /// The plan limits and features apply to; `free` when the account has no row
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn effective_plan(&mut self, user_id: UserId) -> Result<Plan> {
        let plan = sqlx::query_scalar::<_, Plan>("SELECT plan FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(plan.unwrap_or_default())
    }

    /// Record the processor customer id. Returns false when the account has no row.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn set_customer_id(&mut self, user_id: UserId, customer_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE subscriptions SET stripe_customer_id = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(customer_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the processor-driven columns. Returns false when the account has no row.
    #[instrument(skip(self, state), fields(user_id = %abbrev_uuid(&user_id), plan = %state.plan), err)]
    pub async fn apply_state(&mut self, user_id: UserId, state: &SubscriptionStateUpdate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                plan = $2,
                billing_cycle = $3,
                status = $4,
                stripe_subscription_id = $5,
                current_period_start = $6,
                current_period_end = $7,
                cancel_at_period_end = $8
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(state.plan)
        .bind(state.billing_cycle)
        .bind(state.status)
        .bind(&state.stripe_subscription_id)
        .bind(state.current_period_start)
        .bind(state.current_period_end)
        .bind(state.cancel_at_period_end)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), status = status.as_str()), err)]
    pub async fn set_status(&mut self, user_id: UserId, status: SubscriptionStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE subscriptions SET status = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(status)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

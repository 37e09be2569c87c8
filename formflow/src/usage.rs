//! Metered usage for a tenant and the plan-limit checks built on it.
//!
//! Usage is always computed from the tables, never cached: active (non-archived) forms,
//! submissions since the first instant of the current UTC month, and seats (the owner plus every
//! invitation, pending or accepted).

use chrono::{DateTime, Datelike, TimeZone, Utc};
use sqlx::PgConnection;

use crate::db::errors::Result as DbResult;
use crate::db::handlers::{Forms, Submissions, TeamMembers};
use crate::errors::{Error, Result};
use crate::forms::{FieldType, FormField};
use crate::plans::{Feature, Plan, can_add_team_member, can_create_form, can_receive_response, is_feature_available};
use crate::types::UserId;

/// First instant of the UTC calendar month containing `now`
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub forms: i64,
    pub responses_this_month: i64,
    pub seats: i64,
}

pub async fn responses_this_month(conn: &mut PgConnection, owner_id: UserId) -> DbResult<i64> {
    Submissions::new(conn).count_since_for_owner(owner_id, month_start(Utc::now())).await
}

/// The owner occupies one seat
pub async fn seats_in_use(conn: &mut PgConnection, owner_id: UserId) -> DbResult<i64> {
    Ok(1 + TeamMembers::new(conn).count(owner_id).await?)
}

pub async fn current_usage(conn: &mut PgConnection, owner_id: UserId) -> DbResult<Usage> {
    Ok(Usage {
        forms: Forms::new(&mut *conn).count_active(owner_id).await?,
        responses_this_month: responses_this_month(&mut *conn, owner_id).await?,
        seats: seats_in_use(conn, owner_id).await?,
    })
}

pub fn check_form_limit(plan: Plan, active_forms: i64) -> Result<()> {
    if can_create_form(plan, active_forms) {
        return Ok(());
    }
    Err(Error::PlanLimitExceeded {
        message: format!(
            "The {} plan allows {} active forms. Upgrade your plan to create more.",
            plan.name(),
            plan.limits().forms
        ),
    })
}

pub fn check_response_limit(plan: Plan, responses_this_month: i64) -> Result<()> {
    if can_receive_response(plan, responses_this_month) {
        return Ok(());
    }
    Err(Error::PlanLimitExceeded {
        message: "This form is not accepting responses right now because its organization has reached its monthly response limit."
            .to_string(),
    })
}

/// File upload fields need a plan with the file uploads feature
pub fn check_file_fields(plan: Plan, fields: &[FormField]) -> Result<()> {
    if is_feature_available(plan, Feature::FileUploads) || !fields.iter().any(|f| f.field_type == FieldType::File) {
        return Ok(());
    }
    Err(Error::PlanLimitExceeded {
        message: format!("File upload fields are not included in the {} plan", plan.name()),
    })
}

pub fn check_seat_limit(plan: Plan, seats: i64) -> Result<()> {
    if can_add_team_member(plan, seats) {
        return Ok(());
    }
    Err(Error::PlanLimitExceeded {
        message: format!(
            "The {} plan includes {} seats. Upgrade your plan to invite more team members.",
            plan.name(),
            plan.limits().seats
        ),
    })
}

//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows. These models are used by repositories to return query results
//! and accept insertion/update data.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each `*DBResponse` struct matches a table row and derives `sqlx::FromRow`
//! - **Separation**: Database models are distinct from API models to allow
//!   independent evolution of storage and API representations
//! - **JSON columns**: `forms.fields`, `forms.settings` and `form_submissions.data` are typed
//!   through `sqlx::types::Json`
//! - **Enums in TEXT columns**: status/role/condition enums derive `sqlx::Type` with
//!   `type_name = "TEXT"`, matching the `CHECK` constraints in the migrations
//!
//! # Model Categories
//!
//! ## Accounts
//!
//! - [`users`]: credentials
//! - [`profiles`]: display information for an account
//! - [`subscriptions`]: the account's plan and processor state
//! - [`organization_settings`]: branding and contact details
//! - [`team_members`]: invitations and seats
//!
//! ## Content
//!
//! - [`forms`], [`submissions`]: form definitions and collected responses
//! - [`links`]: saved resource links
//! - [`inventory`]: tracked items and supplies

pub mod forms;
pub mod inventory;
pub mod links;
pub mod organization_settings;
pub mod profiles;
pub mod submissions;
pub mod subscriptions;
pub mod team_members;
pub mod users;

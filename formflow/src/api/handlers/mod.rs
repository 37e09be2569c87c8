//! HTTP request handlers for all API endpoints.
//!
//! Handlers are grouped by resource. Each one extracts the signed-in
//! [`CurrentUser`](crate::api::models::users::CurrentUser) where the route needs
//! a session, scopes every query to that user's rows, and returns
//! [`crate::errors::Error`] which renders as `{"message": ...}` with the matching
//! status code.
//!
//! # Handler Modules
//!
//! - [`auth`]: Registration, login, logout and password management
//! - [`account`]: The signed-in user, their profile and the dashboard summary
//! - [`forms`]: Form CRUD plus publish and archive toggles
//! - [`submissions`]: Public form rendering and intake, owner-side listing
//! - [`reports`]: Per-field summaries, CSV export and the overview chart
//! - [`links`]: Saved links, flat and grouped by category
//! - [`inventory`]: Inventory items
//! - [`settings`]: Organization branding and contact details
//! - [`team`]: Invitations, roles and seat enforcement
//! - [`billing`]: Plans, checkout, the billing portal and provider webhooks

pub mod account;
pub mod auth;
pub mod billing;
pub mod forms;
pub mod inventory;
pub mod links;
pub mod reports;
pub mod settings;
pub mod submissions;
pub mod team;

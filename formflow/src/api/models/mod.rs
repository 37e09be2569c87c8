//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database models,
//!   allowing independent evolution of API and storage representations
//! - **Partial updates**: `PATCH` bodies use `Option<Option<T>>` (via `serde_with`'s
//!   `double_option`) so that an absent field is left alone and `null` clears it
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API docs
//!
//! # Model Categories
//!
//! ## Account
//!
//! - [`auth`]: Registration, login and password payloads
//! - [`users`]: The signed-in account, profile and dashboard
//! - [`billing`]: Plans, subscription state and hosted billing sessions
//! - [`settings`]: Organization branding
//! - [`team`]: Invitations and seats
//!
//! ## Content
//!
//! - [`forms`]: Form definitions, including the public view
//! - [`submissions`]: Collected responses and reports
//! - [`links`]: Saved resource links
//! - [`inventory`]: Tracked items

pub mod auth;
pub mod billing;
pub mod forms;
pub mod inventory;
pub mod links;
pub mod pagination;
pub mod settings;
pub mod submissions;
pub mod team;
pub mod users;

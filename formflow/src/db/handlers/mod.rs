//! Repository implementations for database access.
//!
//! This module provides repository structs for each table. Repositories follow a consistent
//! pattern, and the ones backing plain CRUD resources implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a borrowed `PgConnection` (a pooled connection or an open transaction)
//! - Provides strongly-typed operations over one table
//! - Returns models from [`crate::db::models`]
//! - Leaves tenant checks to the caller, which compares the row's owner with the current user
//!
//! # Available Repositories
//!
//! - [`Users`], [`Profiles`], [`Subscriptions`], [`OrganizationSettings`]: account records
//! - [`Forms`], [`Submissions`]: form definitions and responses
//! - [`Links`], [`InventoryItems`]: tenant-owned CRUD resources
//! - [`TeamMembers`]: invitations and seats
//!
//! # Common Pattern
//!
//! ```ignore
//! use formflow::db::handlers::{Forms, Repository, forms::FormFilter};
//!
//! async fn example(pool: &sqlx::PgPool, user_id: uuid::Uuid) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Forms::new(&mut tx);
//!
//!     let forms = repo.list(&FormFilter::new(user_id, 0, 100)).await?;
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod forms;
pub mod inventory;
pub mod links;
pub mod organization_settings;
pub mod profiles;
pub mod repository;
pub mod submissions;
pub mod subscriptions;
pub mod team_members;
pub mod users;

pub use forms::Forms;
pub use inventory::InventoryItems;
pub use links::Links;
pub use organization_settings::OrganizationSettings;
pub use profiles::Profiles;
pub use repository::Repository;
pub use submissions::Submissions;
pub use subscriptions::Subscriptions;
pub use team_members::TeamMembers;
pub use users::Users;

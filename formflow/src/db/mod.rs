//! Database layer for data persistence and access.
//!
//! SQLx over PostgreSQL, organised as repositories:
//!
//! ```text
//! API handlers ──> db::handlers (repositories) ──> db::models (rows) ──> PostgreSQL
//! ```
//!
//! - [`handlers`]: one repository per table
//! - [`models`]: row structs and the request structs repositories accept
//! - [`errors`]: [`errors::DbError`], classified from sqlx errors
//!
//! # Transactions
//!
//! Repositories borrow a `PgConnection`, so they work the same over a pooled connection or an
//! open transaction. Multi-statement writes (registration, a submission and its form's counter)
//! open a transaction and build each repository from it:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let user = Users::new(&mut tx).create(&request).await?;
//! Subscriptions::new(&mut tx).create_default(user.id).await?;
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are embedded through [`crate::migrator`]; they run on
//! startup.

pub mod errors;
pub mod handlers;
pub mod models;

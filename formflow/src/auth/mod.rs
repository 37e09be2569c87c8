//! Authentication for the tenant-facing API.
//!
//! Accounts are native email/password records. A successful login or registration issues a
//! signed JWT session token, which clients present either as the session cookie
//! (`auth.native.session.cookie_name`) or as an `Authorization: Bearer <token>` header.
//!
//! # Modules
//!
//! - [`current_user`]: the [`CurrentUser`](crate::api::models::users::CurrentUser) extractor
//! - [`password`]: Argon2 hashing and verification
//! - [`session`]: JWT issuing, verification and the session cookie
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use formflow::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.email)
//! }
//! ```
//!
//! Row ownership is not an auth concern here: handlers compare the row's owner with
//! `current_user.id` and answer 404 for rows that belong to someone else.

pub mod current_user;
pub mod password;
pub mod session;

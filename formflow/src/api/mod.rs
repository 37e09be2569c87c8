//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/authentication/*`): Register, login, logout, password changes
//! - **Account** (`/api/v1/me`, `/api/v1/profile`, `/api/v1/dashboard`)
//! - **Forms** (`/api/v1/forms/*`): Builder CRUD, submissions, reports and export
//! - **Public** (`/api/v1/public/forms/*`): Published forms and anonymous submissions
//! - **Links, Inventory, Settings, Team** (`/api/v1/{links,inventory,settings,team}`)
//! - **Billing** (`/api/v1/billing/*`, `/webhooks/billing`)
//!
//! Endpoints carry `utoipa` annotations; the rendered reference lives at `/docs`.

pub mod handlers;
pub mod models;

//! Common type definitions.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases for better readability in signatures:
//!
//! - [`UserId`]: Account identifier (also the tenant key for every owned row)
//! - [`FormId`], [`SubmissionId`], [`LinkId`], [`InventoryItemId`], [`TeamMemberId`]
//!
//! # Authorization
//!
//! [`Resource`] and [`Operation`] describe a rejected action in
//! [`crate::errors::Error::InsufficientPermissions`].

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type FormId = Uuid;
pub type SubmissionId = Uuid;
pub type LinkId = Uuid;
pub type InventoryItemId = Uuid;
pub type TeamMemberId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be attempted on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Forms,
    Submissions,
    Links,
    Inventory,
    OrganizationSettings,
    Team,
    Billing,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Forms => "forms",
            Resource::Submissions => "submissions",
            Resource::Links => "links",
            Resource::Inventory => "inventory",
            Resource::OrganizationSettings => "organization settings",
            Resource::Team => "team",
            Resource::Billing => "billing",
        };
        write!(f, "{name}")
    }
}

// src/model.rs
//
// Typed boundary over the loosely-shaped documents the data service
// delivers. Decoding default-fills optional fields and drops documents
// that cannot be attributed to an owner, so the rest of the crate never
// handles ad hoc shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::store::Document;

/// Collection holding one document per job application.
pub const APPLICATIONS: &str = "applications";
/// Collection holding one profile document per account, keyed by uid.
pub const USERS: &str = "users";

/// Field names as they appear on the wire.
pub mod fields {
    pub const OWNER: &str = "uid";
    pub const COMPANY: &str = "company";
    pub const POSITION: &str = "position";
    pub const STATUS: &str = "status";
    pub const CREATED_AT: &str = crate::store::CREATED_AT;
    pub const USERNAME: &str = "username";
    pub const EMAIL: &str = "email";
    pub const ROLE: &str = "role";
}

/// Access level stored on the profile document. Never inferred
/// client-side beyond that lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Anything but the exact string "admin" is a regular user.
    pub fn parse(value: &str) -> Role {
        match value {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Interview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub fn parse(value: &str) -> Option<ApplicationStatus> {
        match value {
            "applied" => Some(ApplicationStatus::Applied),
            "interview" => Some(ApplicationStatus::Interview),
            "accepted" => Some(ApplicationStatus::Accepted),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One job application as held in the local cache.
///
/// `status` is `None` when the stored string is not one of the known
/// values; the record stays visible but is excluded from statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: String,
    pub owner_id: String,
    pub company: String,
    pub position: String,
    pub status: Option<ApplicationStatus>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ApplicationRecord {
    /// Decode a stored document. Returns `None` for documents that have
    /// no id or no owner; other fields default-fill.
    pub fn from_document(doc: &Document) -> Option<ApplicationRecord> {
        if doc.id.is_empty() {
            return None;
        }
        let owner_id = doc.str_field(fields::OWNER)?.to_string();

        Some(ApplicationRecord {
            id: doc.id.clone(),
            owner_id,
            company: doc.str_field(fields::COMPANY).unwrap_or("").to_string(),
            position: doc.str_field(fields::POSITION).unwrap_or("").to_string(),
            status: doc
                .str_field(fields::STATUS)
                .and_then(ApplicationStatus::parse),
            created_at: doc.str_field(fields::CREATED_AT).and_then(parse_timestamp),
        })
    }
}

/// Profile document for one account. Every field default-fills so a
/// partial profile still yields a usable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn from_document(doc: &Document) -> UserProfile {
        UserProfile {
            username: doc.str_field(fields::USERNAME).unwrap_or("").to_string(),
            email: doc.str_field(fields::EMAIL).unwrap_or("").to_string(),
            role: doc
                .str_field(fields::ROLE)
                .map(Role::parse)
                .unwrap_or_default(),
            created_at: doc.str_field(fields::CREATED_AT).and_then(parse_timestamp),
        }
    }
}

/// The authenticated identity, enriched with the role from the profile
/// lookup. Created on sign-in, cleared on sign-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl SessionIdentity {
    /// Build the identity from the auth user and, when available, the
    /// profile document. The display name is the profile username,
    /// falling back to the local part of the email address.
    pub fn new(user: &AuthUser, profile: Option<&UserProfile>) -> SessionIdentity {
        let name = match profile {
            Some(p) if !p.username.is_empty() => p.username.clone(),
            _ => user.email.split('@').next().unwrap_or("").to_string(),
        };
        SessionIdentity {
            uid: user.uid.clone(),
            name,
            email: user.email.clone(),
            role: profile.map(|p| p.role).unwrap_or_default(),
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

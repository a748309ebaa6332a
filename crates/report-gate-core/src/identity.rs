//! Request identities.
//!
//! The host session is read once at request entry into a typed [`Viewer`].
//! Nothing downstream reaches back into session globals.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::types::UserId;

/// The free-text `CampusRoles` profile attribute.
///
/// Holds values such as `"Senior School:Students"` or
/// `"Senior School:Staff,Boarding:staff"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampusRoles(String);

impl CampusRoles {
    /// Wrap a raw attribute value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw attribute value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the attribute names a staff role as a whole word.
    pub fn is_staff(&self) -> bool {
        static STAFF: OnceLock<Regex> = OnceLock::new();
        STAFF
            .get_or_init(|| Regex::new(r"\b(Staff|staff)\b").expect("static pattern"))
            .is_match(&self.0)
    }

    /// Exact match against a configured role string.
    pub fn is(&self, role: &str) -> bool {
        self.0 == role
    }
}

impl From<&str> for CampusRoles {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The user making the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: UserId,
    pub username: String,
    /// Site administrator flag from the host.
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub campus_roles: CampusRoles,
}

impl Viewer {
    /// A viewer with no special roles.
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            is_admin: false,
            campus_roles: CampusRoles::default(),
        }
    }

    /// Mark as site administrator.
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Set the campus roles attribute.
    pub fn with_campus_roles(mut self, roles: impl Into<String>) -> Self {
        self.campus_roles = CampusRoles::new(roles);
        self
    }

    pub fn is_staff(&self) -> bool {
        self.campus_roles.is_staff()
    }
}

/// The student whose reports are requested, as resolved by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub campus_roles: CampusRoles,
}

impl Subject {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            campus_roles: CampusRoles::default(),
        }
    }

    /// Set the campus roles attribute.
    pub fn with_campus_roles(mut self, roles: impl Into<String>) -> Self {
        self.campus_roles = CampusRoles::new(roles);
        self
    }
}

/// Network details of the caller, recorded with every decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            user_agent: Some(user_agent.into()),
        }
    }
}

/// Everything known about a request at entry.
///
/// Immutable for the life of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub viewer: Viewer,
    #[serde(default)]
    pub client: ClientInfo,
    /// Path of the page the request came from, if any.
    #[serde(default)]
    pub page_path: Option<String>,
}

impl RequestContext {
    pub fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            client: ClientInfo::default(),
            page_path: None,
        }
    }

    pub fn with_client(mut self, client: ClientInfo) -> Self {
        self.client = client;
        self
    }

    pub fn with_page_path(mut self, path: impl Into<String>) -> Self {
        self.page_path = Some(path.into());
        self
    }
}

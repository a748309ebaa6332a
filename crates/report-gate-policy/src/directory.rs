//! The host platform's user and role directory.
//!
//! The policy needs two facts from the host: who a username belongs to, and
//! whether the viewer holds the mentor role over the student. Both are
//! behind the [`Directory`] trait. [`InMemoryDirectory`] derives the mentor
//! fact the way the host does, from role assignments scoped to contexts.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use report_gate_core::{Subject, UserId};

/// Short name of the role that marks a mentor (guardian).
pub const MENTOR_ROLE_SHORTNAME: &str = "parent";

/// A failed directory lookup.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DirectoryError(pub String);

impl DirectoryError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Lookups against the host platform.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve a username to an account, `None` if it does not exist.
    async fn resolve_user(&self, username: &str) -> Result<Option<Subject>, DirectoryError>;

    /// Whether `viewer` holds the mentor role in `subject`'s personal context.
    async fn has_mentor_role(&self, viewer: UserId, subject: UserId)
        -> Result<bool, DirectoryError>;
}

/// Where a role assignment applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextLevel {
    System,
    Course(u64),
    /// A user's personal context, keyed by that user's id.
    User(UserId),
}

/// One role held by one user in one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub user: UserId,
    pub role_id: u64,
    pub context: ContextLevel,
}

#[derive(Default)]
struct DirectoryInner {
    users: HashMap<String, Subject>,
    /// Role short name -> role id.
    roles: HashMap<String, u64>,
    assignments: Vec<RoleAssignment>,
}

/// In-memory directory.
///
/// Used by tests and by hosts that preload their user tables.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: RwLock<DirectoryInner>,
}

impl InMemoryDirectory {
    /// An empty directory with no roles defined.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    pub fn add_user(&self, subject: Subject) -> Result<(), DirectoryError> {
        let mut inner = self.write()?;
        inner.users.insert(subject.username.clone(), subject);
        Ok(())
    }

    /// Define a role.
    pub fn define_role(&self, shortname: &str, role_id: u64) -> Result<(), DirectoryError> {
        let mut inner = self.write()?;
        inner.roles.insert(shortname.to_string(), role_id);
        Ok(())
    }

    /// Record a role assignment.
    pub fn assign(&self, assignment: RoleAssignment) -> Result<(), DirectoryError> {
        let mut inner = self.write()?;
        inner.assignments.push(assignment);
        Ok(())
    }

    /// Define the mentor role (if needed) and assign `mentor` to it in
    /// `mentee`'s personal context.
    pub fn add_mentor(&self, mentor: UserId, mentee: UserId) -> Result<(), DirectoryError> {
        let mut inner = self.write()?;
        let next_id = inner.roles.values().max().copied().unwrap_or(0) + 1;
        let role_id = *inner
            .roles
            .entry(MENTOR_ROLE_SHORTNAME.to_string())
            .or_insert(next_id);
        inner.assignments.push(RoleAssignment {
            user: mentor,
            role_id,
            context: ContextLevel::User(mentee),
        });
        Ok(())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, DirectoryInner>, DirectoryError> {
        self.inner
            .write()
            .map_err(|e| DirectoryError::new(format!("directory lock poisoned: {}", e)))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, DirectoryInner>, DirectoryError> {
        self.inner
            .read()
            .map_err(|e| DirectoryError::new(format!("directory lock poisoned: {}", e)))
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn resolve_user(&self, username: &str) -> Result<Option<Subject>, DirectoryError> {
        Ok(self.read()?.users.get(username).cloned())
    }

    async fn has_mentor_role(
        &self,
        viewer: UserId,
        subject: UserId,
    ) -> Result<bool, DirectoryError> {
        let inner = self.read()?;

        // No mentor role defined on this site means nobody is a mentor.
        let Some(&role_id) = inner.roles.get(MENTOR_ROLE_SHORTNAME) else {
            return Ok(false);
        };

        Ok(inner.assignments.iter().any(|a| {
            a.user == viewer && a.role_id == role_id && a.context == ContextLevel::User(subject)
        }))
    }
}

//! # Report Gate Policy
//!
//! Decides whether a viewer may see a student's reports, and writes every
//! decision to the audit log.
//!
//! ## Rules
//!
//! Checked in order, first match wins:
//!
//! 1. Site administrators viewing someone else: `"admin access"`
//! 2. The student themself: `"self access"`
//! 3. A viewer holding the `parent` role in the student's user context:
//!    `"mentor access"`
//! 4. Staff, only when [`StaffAccess::Allow`] is configured: `"staff access"`
//! 5. Everyone else: denied, `"insufficient permissions"`
//!
//! A student username that does not resolve is an error
//! ([`PolicyError::InvalidSubject`]) and is logged as a denial.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use report_gate_core::{RequestContext, Viewer};
//! use report_gate_policy::{AccessPolicy, InMemoryDirectory, PolicyConfig};
//! use report_gate_store::MemoryAuditLog;
//!
//! async fn example() {
//!     let directory = InMemoryDirectory::new();
//!     let policy = AccessPolicy::new(directory, Arc::new(MemoryAuditLog::new()), PolicyConfig::default());
//!
//!     let ctx = RequestContext::new(Viewer::new(3, "parent1"));
//!     // let decision = policy.evaluate(&ctx, "student2").await?;
//! }
//! ```

pub mod directory;
pub mod error;
pub mod policy;

pub use directory::{
    ContextLevel, Directory, DirectoryError, InMemoryDirectory, RoleAssignment,
    MENTOR_ROLE_SHORTNAME,
};
pub use error::{PolicyError, Result};
pub use policy::{AccessPolicy, PolicyConfig, StaffAccess};

//! Error types for the policy module.

use report_gate_core::Reason;
use thiserror::Error;

use crate::directory::DirectoryError;

/// Errors that stop a decision from being reached.
///
/// A denial is not an error; it is a [`Decision`](report_gate_core::Decision)
/// with `granted == false`.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The student username does not resolve to an account.
    #[error("invalid student username: {0}")]
    InvalidSubject(String),

    /// A directory lookup failed. Never treated as a grant.
    #[error("directory lookup failed: {0}")]
    Directory(#[from] DirectoryError),
}

impl PolicyError {
    /// The reason written to the audit log for this failure.
    pub fn reason(&self) -> Reason {
        match self {
            PolicyError::InvalidSubject(_) => Reason::InvalidSubject,
            PolicyError::Directory(_) => Reason::LookupFailed,
        }
    }
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

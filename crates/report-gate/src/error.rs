//! Error types for the gate.

use report_gate_core::{CoreError, Reason};
use report_gate_policy::PolicyError;
use report_gate_store::StoreError;
use thiserror::Error;

use crate::source::SourceError;

/// Errors returned to callers of [`ReportGate`](crate::ReportGate).
///
/// Hosts map `AccessDenied` to their "no permission" failure and
/// `InvalidSubject` to their "invalid student" failure.
#[derive(Debug, Error)]
pub enum GateError {
    /// The student username does not resolve.
    #[error("invalid student username: {0}")]
    InvalidSubject(String),

    /// The policy refused the request.
    #[error("no permission: {0}")]
    AccessDenied(Reason),

    /// The document id or id list could not be parsed.
    #[error("invalid document reference: {0}")]
    InvalidDocumentRef(#[from] CoreError),

    /// A directory lookup failed while evaluating the policy.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// The report source failed.
    #[error("report source error: {0}")]
    Source(#[from] SourceError),

    /// Reading the audit log failed.
    #[error("audit store error: {0}")]
    Store(#[from] StoreError),

    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<PolicyError> for GateError {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::InvalidSubject(username) => GateError::InvalidSubject(username),
            PolicyError::Directory(inner) => GateError::Lookup(inner.to_string()),
        }
    }
}

/// Result type for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;

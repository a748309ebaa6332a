//! The report store collaborator.
//!
//! Reports live in an external database reached through stored procedures.
//! The gate only needs three operations from it, behind [`DocumentSource`].
//! The source is only ever called after the policy granted the request.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use report_gate_core::DocumentId;

/// A failure inside the report store.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The store could not be reached or the procedure failed.
    #[error("report store unavailable: {0}")]
    Unavailable(String),

    /// The requested document does not exist.
    #[error("document not found: {0}")]
    NotFound(DocumentId),
}

/// One report as listed for a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDescriptor {
    pub id: DocumentId,
    pub description: String,
    pub created: NaiveDateTime,
}

/// A fetched report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub id: DocumentId,
    pub description: String,
    /// Raw PDF bytes.
    pub bytes: Bytes,
}

/// Access to the external report store.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Reports of `subject_username` visible to `viewer_username`.
    async fn list_reports(
        &self,
        subject_username: &str,
        viewer_username: &str,
    ) -> Result<Vec<ReportDescriptor>, SourceError>;

    /// Raw bytes of one report.
    async fn fetch_document(&self, id: DocumentId) -> Result<Bytes, SourceError>;

    /// Several reports in one call.
    async fn fetch_documents(&self, ids: &[DocumentId]) -> Result<Vec<ReportFile>, SourceError>;
}

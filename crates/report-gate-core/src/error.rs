//! Error types for Report Gate Core.

use thiserror::Error;

/// Core errors for parsing and encoding request data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid document reference: {0}")]
    InvalidDocumentRef(String),

    #[error("document list is empty")]
    EmptyDocumentList,

    #[error("unknown decision reason: {0}")]
    UnknownReason(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

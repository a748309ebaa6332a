//! Document references.
//!
//! A request names either one document or a list of them. Lists arrive as
//! a comma-delimited string (`"4,5,6"`) or a JSON array (`"[4,5,6]"`,
//! `"[\"4\",\"5\"]"`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::types::DocumentId;

/// What a request asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentRef {
    /// No document (profile widget listing, or a failed lookup).
    #[default]
    None,
    /// A single report.
    Single(DocumentId),
    /// A bundle of reports.
    Batch(Vec<DocumentId>),
}

impl DocumentRef {
    /// Parse a document id list.
    ///
    /// Rejects empty lists and any element that is not an unsigned integer.
    pub fn parse_list(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        let inner = match trimmed.strip_prefix('[') {
            Some(rest) => rest
                .strip_suffix(']')
                .ok_or_else(|| CoreError::InvalidDocumentRef(trimmed.to_string()))?,
            None => trimmed,
        };

        if inner.trim().is_empty() {
            return Err(CoreError::EmptyDocumentList);
        }

        let ids = inner
            .split(',')
            .map(str::parse::<DocumentId>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::Batch(ids))
    }

    /// All ids named by this reference.
    pub fn ids(&self) -> &[DocumentId] {
        match self {
            Self::None => &[],
            Self::Single(id) => std::slice::from_ref(id),
            Self::Batch(ids) => ids,
        }
    }

    /// The id of a single-document request.
    pub fn single_id(&self) -> Option<DocumentId> {
        match self {
            Self::Single(id) => Some(*id),
            _ => None,
        }
    }

    /// Comma-joined ids of a batch request.
    pub fn sequences(&self) -> Option<String> {
        match self {
            Self::Batch(ids) => Some(
                ids.iter()
                    .map(DocumentId::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            _ => None,
        }
    }

    /// Rebuild from the two stored columns.
    pub fn from_columns(
        document_id: Option<u64>,
        sequences: Option<&str>,
    ) -> Result<Self, CoreError> {
        match (document_id, sequences) {
            (Some(id), _) => Ok(Self::Single(DocumentId(id))),
            (None, Some(seqs)) => Self::parse_list(seqs),
            (None, None) => Ok(Self::None),
        }
    }
}

impl From<DocumentId> for DocumentRef {
    fn from(id: DocumentId) -> Self {
        Self::Single(id)
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "-"),
            Self::Single(id) => write!(f, "{}", id),
            Self::Batch(_) => write!(f, "[{}]", self.sequences().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(v: &[u64]) -> Vec<DocumentId> {
        v.iter().copied().map(DocumentId).collect()
    }

    #[test]
    fn test_parse_comma_list() {
        let r = DocumentRef::parse_list("4, 5,6").unwrap();
        assert_eq!(r, DocumentRef::Batch(ids(&[4, 5, 6])));
    }

    #[test]
    fn test_parse_json_array() {
        assert_eq!(
            DocumentRef::parse_list("[10,11]").unwrap(),
            DocumentRef::Batch(ids(&[10, 11]))
        );
        assert_eq!(
            DocumentRef::parse_list(r#"["10","11"]"#).unwrap(),
            DocumentRef::Batch(ids(&[10, 11]))
        );
    }

    #[test]
    fn test_parse_rejects_empty_and_garbage() {
        assert!(matches!(
            DocumentRef::parse_list(""),
            Err(CoreError::EmptyDocumentList)
        ));
        assert!(matches!(
            DocumentRef::parse_list("[]"),
            Err(CoreError::EmptyDocumentList)
        ));
        assert!(DocumentRef::parse_list("1,,2").is_err());
        assert!(DocumentRef::parse_list("[1,2").is_err());
        assert!(DocumentRef::parse_list("1;2").is_err());
        assert!(DocumentRef::parse_list(r#"["1",2"]"#).is_err());
        assert!(DocumentRef::parse_list(r#"["1","2"]"#).is_ok());
    }

    #[test]
    fn test_columns() {
        let single = DocumentRef::Single(DocumentId(3));
        assert_eq!(single.single_id(), Some(DocumentId(3)));
        assert_eq!(single.sequences(), None);

        let batch = DocumentRef::Batch(ids(&[1, 2]));
        assert_eq!(batch.sequences().as_deref(), Some("1,2"));
        assert_eq!(
            DocumentRef::from_columns(None, Some("1,2")).unwrap(),
            batch
        );
        assert_eq!(DocumentRef::from_columns(Some(3), None).unwrap(), single);
        assert_eq!(
            DocumentRef::from_columns(None, None).unwrap(),
            DocumentRef::None
        );
    }

    #[test]
    fn test_ids_view() {
        assert!(DocumentRef::None.ids().is_empty());
        assert_eq!(DocumentRef::Single(DocumentId(8)).ids(), &[DocumentId(8)]);
    }

    proptest! {
        #[test]
        fn prop_list_forms_agree(raw in prop::collection::vec(any::<u64>(), 1..20)) {
            let comma = raw.iter().map(u64::to_string).collect::<Vec<_>>().join(",");
            let bracketed = format!("[{}]", comma);

            let expected = ids(&raw);

            let a = DocumentRef::parse_list(&comma).unwrap();
            let b = DocumentRef::parse_list(&bracketed).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.ids(), expected.as_slice());
            prop_assert_eq!(a.sequences(), Some(comma));
        }
    }
}

//! AuditLog trait: the abstract interface for decision persistence.
//!
//! The policy is storage-agnostic. Implementations include SQLite (primary)
//! and in-memory (for tests).

use async_trait::async_trait;
use report_gate_core::{chain_hash, AccessDecision, DocumentRef, EntryHash, UserId};

use crate::error::{Result, StoreError};

/// A stored audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Position in the log, starting at 1.
    pub seq: u64,
    /// The recorded decision.
    pub decision: AccessDecision,
    /// Hash of the previous entry ([`EntryHash::ZERO`] for the first).
    pub prev_hash: EntryHash,
    /// `chain_hash(prev_hash, decision)`.
    pub entry_hash: EntryHash,
}

impl AuditEntry {
    /// Build the entry that follows `prev` (or starts the log).
    pub fn next(prev: Option<&AuditEntry>, decision: AccessDecision) -> Self {
        let (seq, prev_hash) = match prev {
            Some(p) => (p.seq + 1, p.entry_hash),
            None => (1, EntryHash::ZERO),
        };
        let entry_hash = chain_hash(&prev_hash, &decision);
        Self {
            seq,
            decision,
            prev_hash,
            entry_hash,
        }
    }
}

/// Outcome of walking the hash chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStatus {
    /// Every entry links to its predecessor.
    Intact { entries: u64 },
    /// The chain breaks at `seq`.
    Broken { seq: u64, detail: String },
}

impl ChainStatus {
    pub fn is_intact(&self) -> bool {
        matches!(self, ChainStatus::Intact { .. })
    }
}

/// Reject a record that could not be read back once stored.
///
/// An empty batch has no column form: its `sequences` value would fail to
/// parse on every later read, and the row can never be removed.
pub fn check_recordable(decision: &AccessDecision) -> Result<()> {
    if matches!(&decision.document, DocumentRef::Batch(ids) if ids.is_empty()) {
        return Err(StoreError::InvalidData(
            "audit record names an empty document batch".to_string(),
        ));
    }
    Ok(())
}

/// Verify a full log, ordered by seq.
///
/// Detects missing sequence numbers, relinked entries and edited records.
pub fn verify_entries(entries: &[AuditEntry]) -> ChainStatus {
    let mut expected_prev = EntryHash::ZERO;

    for (index, entry) in entries.iter().enumerate() {
        let expected_seq = index as u64 + 1;
        if entry.seq != expected_seq {
            return ChainStatus::Broken {
                seq: entry.seq,
                detail: format!("expected seq {}", expected_seq),
            };
        }
        if entry.prev_hash != expected_prev {
            return ChainStatus::Broken {
                seq: entry.seq,
                detail: format!("prev hash {} does not link", entry.prev_hash),
            };
        }
        if chain_hash(&entry.prev_hash, &entry.decision) != entry.entry_hash {
            return ChainStatus::Broken {
                seq: entry.seq,
                detail: "record does not match its hash".to_string(),
            };
        }
        expected_prev = entry.entry_hash;
    }

    ChainStatus::Intact {
        entries: entries.len() as u64,
    }
}

/// The AuditLog trait: async, append-only persistence of decisions.
///
/// There is deliberately no update or delete operation.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append a decision, returning the stored entry.
    async fn record(&self, decision: &AccessDecision) -> Result<AuditEntry>;

    /// All entries, ordered by seq.
    async fn entries(&self) -> Result<Vec<AuditEntry>>;

    /// Entries about one student, ordered by seq.
    async fn entries_for_subject(&self, subject_username: &str) -> Result<Vec<AuditEntry>>;

    /// Entries made by one viewer, ordered by seq.
    async fn entries_for_viewer(&self, viewer_id: UserId) -> Result<Vec<AuditEntry>>;

    /// Number of entries.
    async fn count(&self) -> Result<u64>;
}

/// Extension trait for operator checks over any log.
pub trait AuditLogExt: AuditLog {
    /// Walk the whole log and check every link.
    fn verify_chain(&self) -> impl std::future::Future<Output = Result<ChainStatus>> + Send;
}

impl<L: AuditLog + ?Sized> AuditLogExt for L {
    async fn verify_chain(&self) -> Result<ChainStatus> {
        let entries = self.entries().await?;
        let status = verify_entries(&entries);
        if let ChainStatus::Broken { seq, ref detail } = status {
            tracing::error!(seq, detail = %detail, "audit chain broken");
        }
        Ok(status)
    }
}

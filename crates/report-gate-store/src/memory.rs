//! In-memory implementation of the AuditLog trait.
//!
//! Primarily for testing. Same semantics as SQLite, including the hash
//! chain, but nothing survives a drop.

use std::sync::RwLock;

use async_trait::async_trait;

use report_gate_core::{AccessDecision, UserId};

use crate::error::{Result, StoreError};
use crate::traits::{check_recordable, AuditEntry, AuditLog};

/// In-memory audit log. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(&self, keep: impl Fn(&AuditEntry) -> bool) -> Result<Vec<AuditEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(entries.iter().filter(|e| keep(e)).cloned().collect())
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record(&self, decision: &AccessDecision) -> Result<AuditEntry> {
        check_recordable(decision)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        let entry = AuditEntry::next(entries.last(), decision.clone());
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn entries(&self) -> Result<Vec<AuditEntry>> {
        self.filtered(|_| true)
    }

    async fn entries_for_subject(&self, subject_username: &str) -> Result<Vec<AuditEntry>> {
        self.filtered(|e| e.decision.subject_username == subject_username)
    }

    async fn entries_for_viewer(&self, viewer_id: UserId) -> Result<Vec<AuditEntry>> {
        self.filtered(|e| e.decision.viewer_id == viewer_id)
    }

    async fn count(&self) -> Result<u64> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(entries.len() as u64)
    }
}

//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime};

use report_gate::{
    DocumentSource, GateConfig, ReportDescriptor, ReportFile, ReportGate, SourceError,
};
use report_gate_core::{AccessDecision, ClientInfo, DocumentId, RequestContext, Subject, UserId, Viewer};
use report_gate_policy::InMemoryDirectory;
use report_gate_store::{AuditEntry, AuditLog, MemoryAuditLog, Result as StoreResult, StoreError};

// ─────────────────────────────────────────────────────────────────────────────
// Document source
// ─────────────────────────────────────────────────────────────────────────────

struct StoredReport {
    owner: String,
    descriptor: ReportDescriptor,
    bytes: Bytes,
}

/// A report source backed by a map.
///
/// Counts byte fetches so tests can assert that a denied request never
/// reached the source.
#[derive(Default)]
pub struct StaticDocumentSource {
    reports: RwLock<HashMap<DocumentId, StoredReport>>,
    fetches: AtomicUsize,
    unavailable: AtomicBool,
}

impl StaticDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a report owned by `owner`.
    pub fn add_report(
        &self,
        owner: &str,
        id: impl Into<DocumentId>,
        description: &str,
        created: NaiveDateTime,
        bytes: impl Into<Bytes>,
    ) {
        let id = id.into();
        let stored = StoredReport {
            owner: owner.to_string(),
            descriptor: ReportDescriptor {
                id,
                description: description.to_string(),
                created,
            },
            bytes: bytes.into(),
        };
        self.reports
            .write()
            .expect("source lock")
            .insert(id, stored);
    }

    /// Make every call fail as if the store were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `fetch_document`/`fetch_documents` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<DocumentId, StoredReport>>, SourceError> {
        self.reports
            .read()
            .map_err(|e| SourceError::Unavailable(format!("source lock poisoned: {}", e)))
    }

    fn check_available(&self) -> Result<(), SourceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(SourceError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentSource for StaticDocumentSource {
    async fn list_reports(
        &self,
        subject_username: &str,
        _viewer_username: &str,
    ) -> Result<Vec<ReportDescriptor>, SourceError> {
        self.check_available()?;
        let reports = self.read()?;
        let mut listed: Vec<ReportDescriptor> = reports
            .values()
            .filter(|r| r.owner == subject_username)
            .map(|r| r.descriptor.clone())
            .collect();
        listed.sort_by_key(|r| r.id);
        Ok(listed)
    }

    async fn fetch_document(&self, id: DocumentId) -> Result<Bytes, SourceError> {
        self.check_available()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let reports = self.read()?;
        reports
            .get(&id)
            .map(|r| r.bytes.clone())
            .ok_or(SourceError::NotFound(id))
    }

    async fn fetch_documents(&self, ids: &[DocumentId]) -> Result<Vec<ReportFile>, SourceError> {
        self.check_available()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let reports = self.read()?;
        ids.iter()
            .map(|id| {
                reports
                    .get(id)
                    .map(|r| ReportFile {
                        id: *id,
                        description: r.descriptor.description.clone(),
                        bytes: r.bytes.clone(),
                    })
                    .ok_or(SourceError::NotFound(*id))
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Audit log
// ─────────────────────────────────────────────────────────────────────────────

/// An audit log whose every write fails.
pub struct RejectingAuditLog;

#[async_trait]
impl AuditLog for RejectingAuditLog {
    async fn record(&self, _decision: &AccessDecision) -> StoreResult<AuditEntry> {
        Err(StoreError::WriteRejected("disk full".into()))
    }

    async fn entries(&self) -> StoreResult<Vec<AuditEntry>> {
        Ok(Vec::new())
    }

    async fn entries_for_subject(&self, _subject_username: &str) -> StoreResult<Vec<AuditEntry>> {
        Ok(Vec::new())
    }

    async fn entries_for_viewer(&self, _viewer_id: UserId) -> StoreResult<Vec<AuditEntry>> {
        Ok(Vec::new())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixture
// ─────────────────────────────────────────────────────────────────────────────

/// A gate over in-memory collaborators with a small school already loaded.
///
/// | id | username  | notes                                  |
/// |----|-----------|----------------------------------------|
/// | 1  | admin1    | site administrator                     |
/// | 2  | student2  | `Senior School:Students`, reports A, B |
/// | 3  | stranger3 | no relationship to anyone              |
/// | 4  | parent4   | mentor of student2                     |
/// | 5  | teacher5  | `Senior School:Staff`                  |
/// | 6  | junior6   | `Junior School:Students`, report C     |
pub struct TestFixture {
    pub gate: ReportGate<InMemoryDirectory, MemoryAuditLog, StaticDocumentSource>,
}

impl TestFixture {
    pub const REPORT_A: DocumentId = DocumentId(101);
    pub const REPORT_B: DocumentId = DocumentId(102);
    pub const REPORT_C: DocumentId = DocumentId(201);

    /// The fixture with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GateConfig::default())
    }

    /// The fixture with a custom configuration.
    pub fn with_config(config: GateConfig) -> Self {
        Self {
            gate: ReportGate::new(school_directory(), MemoryAuditLog::new(), school_source(), config),
        }
    }

    pub fn admin(&self) -> RequestContext {
        context(Viewer::new(1, "admin1").admin())
    }

    pub fn student(&self) -> RequestContext {
        context(Viewer::new(2, "student2").with_campus_roles("Senior School:Students"))
    }

    pub fn stranger(&self) -> RequestContext {
        context(Viewer::new(3, "stranger3"))
    }

    pub fn parent(&self) -> RequestContext {
        context(Viewer::new(4, "parent4"))
    }

    pub fn teacher(&self) -> RequestContext {
        context(Viewer::new(5, "teacher5").with_campus_roles("Senior School:Staff"))
    }

    /// Number of audit entries written so far.
    pub async fn audit_count(&self) -> u64 {
        self.gate.log().count().await.expect("memory log count")
    }

    /// The most recent audit entry.
    pub async fn last_entry(&self) -> Option<AuditEntry> {
        self.gate
            .log()
            .entries()
            .await
            .expect("memory log entries")
            .pop()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A request context with a fixed client.
pub fn context(viewer: Viewer) -> RequestContext {
    RequestContext::new(viewer).with_client(ClientInfo::new("10.0.0.7", "testkit/1.0"))
}

/// The directory behind [`TestFixture`].
pub fn school_directory() -> InMemoryDirectory {
    let directory = InMemoryDirectory::new();
    let users = [
        Subject::new(1, "admin1"),
        Subject::new(2, "student2").with_campus_roles("Senior School:Students"),
        Subject::new(3, "stranger3"),
        Subject::new(4, "parent4"),
        Subject::new(5, "teacher5").with_campus_roles("Senior School:Staff"),
        Subject::new(6, "junior6").with_campus_roles("Junior School:Students"),
    ];
    for user in users {
        directory.add_user(user).expect("fresh directory");
    }
    directory
        .add_mentor(UserId(4), UserId(2))
        .expect("fresh directory");
    directory
}

/// The report source behind [`TestFixture`].
pub fn school_source() -> StaticDocumentSource {
    let source = StaticDocumentSource::new();
    source.add_report(
        "student2",
        TestFixture::REPORT_A,
        "Semester 1 Report",
        date(2024, 6, 28),
        &b"%PDF-1.4 semester one"[..],
    );
    source.add_report(
        "student2",
        TestFixture::REPORT_B,
        "Semester 2 Report",
        date(2024, 12, 6),
        &b"%PDF-1.4 semester two"[..],
    );
    source.add_report(
        "junior6",
        TestFixture::REPORT_C,
        "Junior Report",
        date(2024, 6, 28),
        &b"%PDF-1.4 junior"[..],
    );
    source
}

fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .expect("valid fixture date")
}

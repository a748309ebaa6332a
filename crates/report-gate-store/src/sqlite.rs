//! SQLite implementation of the AuditLog trait.
//!
//! The primary backend. Uses rusqlite with bundled SQLite, wrapped in async
//! via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use report_gate_core::{AccessDecision, DocumentRef, EntryHash, Reason, UserId};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{check_recordable, AuditEntry, AuditLog};

const SELECT_COLUMNS: &str = "SELECT id, user_id, viewer_username, student_username,
        document_id, sequences, access_granted, reason, ip_address, user_agent,
        time_created, prev_hash, entry_hash
     FROM access_log";

/// SQLite-based audit log.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteAuditLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAuditLog {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` on the connection inside a blocking task.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::TaskJoin(e.to_string()))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::LockPoisoned(e.to_string()))
}

/// Column values of one `access_log` row, before validation.
struct RawRow {
    id: i64,
    user_id: i64,
    viewer_username: String,
    student_username: String,
    document_id: Option<i64>,
    sequences: Option<String>,
    access_granted: bool,
    reason: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    time_created: i64,
    prev_hash: Vec<u8>,
    entry_hash: Vec<u8>,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            viewer_username: row.get("viewer_username")?,
            student_username: row.get("student_username")?,
            document_id: row.get("document_id")?,
            sequences: row.get("sequences")?,
            access_granted: row.get("access_granted")?,
            reason: row.get("reason")?,
            ip_address: row.get("ip_address")?,
            user_agent: row.get("user_agent")?,
            time_created: row.get("time_created")?,
            prev_hash: row.get("prev_hash")?,
            entry_hash: row.get("entry_hash")?,
        })
    }

    fn into_entry(self) -> Result<AuditEntry> {
        let document = DocumentRef::from_columns(
            self.document_id.map(|id| id as u64),
            self.sequences.as_deref(),
        )?;
        let reason: Reason = self.reason.parse()?;

        Ok(AuditEntry {
            seq: self.id as u64,
            decision: AccessDecision {
                viewer_id: UserId(self.user_id as u64),
                viewer_username: self.viewer_username,
                subject_username: self.student_username,
                document,
                granted: self.access_granted,
                reason,
                timestamp: self.time_created,
                client_ip: self.ip_address,
                client_agent: self.user_agent,
            },
            prev_hash: EntryHash::from_slice(&self.prev_hash)?,
            entry_hash: EntryHash::from_slice(&self.entry_hash)?,
        })
    }
}

fn query_entries(
    conn: &Connection,
    filter: &str,
    param: Option<&dyn rusqlite::ToSql>,
) -> Result<Vec<AuditEntry>> {
    let sql = format!("{} {} ORDER BY id", SELECT_COLUMNS, filter);
    let mut stmt = conn.prepare(&sql)?;
    let rows = match param {
        Some(p) => stmt
            .query_map(&[p][..], RawRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        None => stmt
            .query_map([], RawRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
    };
    rows.into_iter().map(RawRow::into_entry).collect()
}

#[async_trait]
impl AuditLog for SqliteAuditLog {
    async fn record(&self, decision: &AccessDecision) -> Result<AuditEntry> {
        check_recordable(decision)?;
        let decision = decision.clone();

        self.run(move |conn| {
            let tx = conn.transaction()?;

            let last: Option<(i64, Vec<u8>)> = tx
                .query_row(
                    "SELECT id, entry_hash FROM access_log ORDER BY id DESC LIMIT 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let prev_hash = match &last {
                Some((_, hash)) => EntryHash::from_slice(hash)?,
                None => EntryHash::ZERO,
            };
            let entry_hash = report_gate_core::chain_hash(&prev_hash, &decision);

            tx.execute(
                "INSERT INTO access_log (
                    user_id, viewer_username, student_username, document_id,
                    sequences, access_granted, reason, ip_address, user_agent,
                    time_created, prev_hash, entry_hash
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    decision.viewer_id.get() as i64,
                    decision.viewer_username,
                    decision.subject_username,
                    decision.document.single_id().map(|id| id.get() as i64),
                    decision.document.sequences(),
                    decision.granted,
                    decision.reason.as_str(),
                    decision.client_ip,
                    decision.client_agent,
                    decision.timestamp,
                    prev_hash.as_bytes().as_slice(),
                    entry_hash.as_bytes().as_slice(),
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(AuditEntry {
                seq: id as u64,
                decision,
                prev_hash,
                entry_hash,
            })
        })
        .await
    }

    async fn entries(&self) -> Result<Vec<AuditEntry>> {
        self.run(|conn| query_entries(conn, "", None)).await
    }

    async fn entries_for_subject(&self, subject_username: &str) -> Result<Vec<AuditEntry>> {
        let username = subject_username.to_string();
        self.run(move |conn| {
            let param: &dyn rusqlite::ToSql = &username;
            query_entries(conn, "WHERE student_username = ?1", Some(param))
        })
        .await
    }

    async fn entries_for_viewer(&self, viewer_id: UserId) -> Result<Vec<AuditEntry>> {
        let id = viewer_id.get() as i64;
        self.run(move |conn| {
            let param: &dyn rusqlite::ToSql = &id;
            query_entries(conn, "WHERE user_id = ?1", Some(param))
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.run(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM access_log", [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await
    }
}

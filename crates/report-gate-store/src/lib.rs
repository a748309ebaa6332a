//! # Report Gate Store
//!
//! Append-only audit log for access decisions. Provides a trait-based
//! interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! Every policy evaluation produces one [`AccessDecision`] which is appended
//! here. Entries are never updated or deleted. Each entry carries the hash of
//! its predecessor, so a gap or an edited row shows up in
//! [`AuditLogExt::verify_chain`].
//!
//! ## Key Types
//!
//! - [`AuditLog`] - The async trait for all audit operations
//! - [`SqliteAuditLog`] - SQLite-based persistent log
//! - [`MemoryAuditLog`] - In-memory log for tests
//! - [`AuditEntry`] - A stored record with its chain hashes
//! - [`ChainStatus`] - Result of verifying the chain
//!
//! ## Usage
//!
//! ```rust,no_run
//! use report_gate_store::{AuditLog, AuditLogExt, SqliteAuditLog};
//!
//! async fn example() {
//!     let log = SqliteAuditLog::open("audit.db").unwrap();
//!
//!     // let entry = log.record(&decision).await.unwrap();
//!     let status = log.verify_chain().await.unwrap();
//!     assert!(status.is_intact());
//! }
//! ```
//!
//! [`AccessDecision`]: report_gate_core::AccessDecision

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryAuditLog;
pub use sqlite::SqliteAuditLog;
pub use traits::{check_recordable, verify_entries, AuditEntry, AuditLog, AuditLogExt, ChainStatus};

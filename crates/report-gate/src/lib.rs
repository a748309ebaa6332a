//! # Report Gate
//!
//! Permission-gated retrieval of student report documents.
//!
//! ## Overview
//!
//! A learning platform shows a small widget on a student's profile listing
//! report documents (PDFs) held in an external database. Viewers can open
//! one report or download them all. Report Gate decides who may do that and
//! keeps an append-only, hash-chained record of every decision.
//!
//! - **Policy**: admin, self and mentor rules, plus an explicit staff setting
//! - **Audit**: one entry per access attempt, granted or not
//! - **Retrieval**: the report source is only called after a grant
//!
//! ## Usage
//!
//! ```rust,no_run
//! use report_gate::{GateConfig, ReportGate};
//! use report_gate::core::{DocumentId, RequestContext, Viewer};
//! use report_gate::policy::InMemoryDirectory;
//! use report_gate::store::SqliteAuditLog;
//!
//! async fn example<S: report_gate::DocumentSource>(source: S) {
//!     let directory = InMemoryDirectory::new();
//!     let log = SqliteAuditLog::open("audit.db").unwrap();
//!     let gate = ReportGate::new(directory, log, source, GateConfig::default());
//!
//!     let ctx = RequestContext::new(Viewer::new(3, "parent1"));
//!     match gate.fetch_report(&ctx, "student2", DocumentId::new(900)).await {
//!         Ok(pdf) => println!("{} bytes", pdf.len()),
//!         Err(e) => eprintln!("{}", e),
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `report_gate::core` - Identities, document references, decisions
//! - `report_gate::store` - Audit log trait, SQLite and in-memory logs
//! - `report_gate::policy` - The access policy and directory trait

pub mod config;
pub mod error;
pub mod gate;
pub mod source;
pub mod widget;

// Re-export component crates
pub use report_gate_core as core;
pub use report_gate_policy as policy;
pub use report_gate_store as store;

// Re-export main types for convenience
pub use config::GateConfig;
pub use error::{GateError, Result};
pub use gate::ReportGate;
pub use source::{DocumentSource, ReportDescriptor, ReportFile, SourceError};
pub use widget::{ProfileWidget, WidgetRow};

pub use report_gate_core::{
    AccessDecision, Decision, DocumentId, DocumentRef, Reason, RequestContext, Subject, UserId,
    Viewer,
};

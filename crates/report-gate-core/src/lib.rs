//! # Report Gate Core
//!
//! Pure primitives for Report Gate: who is asking, whose reports they want,
//! which documents, and what the access policy decided.
//!
//! This crate contains no I/O, no storage, no policy. It is plain data plus
//! the canonical encoding used to hash-chain audit records.
//!
//! ## Key Types
//!
//! - [`Viewer`] - The requester, populated once from the host session
//! - [`Subject`] - The student whose reports are requested
//! - [`RequestContext`] - Viewer plus client details, passed explicitly
//! - [`DocumentRef`] - Opaque document id or id list
//! - [`Decision`] / [`Reason`] - Policy outcome
//! - [`AccessDecision`] - The audit record written for every evaluation
//!
//! ## Canonicalization
//!
//! Audit records are encoded using deterministic CBOR before hashing. See
//! the [`canonical`] module.

pub mod canonical;
pub mod decision;
pub mod document;
pub mod error;
pub mod hash;
pub mod identity;
pub mod types;

pub use canonical::{canonical_decision_bytes, chain_hash};
pub use decision::{AccessDecision, Decision, Reason};
pub use document::DocumentRef;
pub use error::CoreError;
pub use hash::EntryHash;
pub use identity::{CampusRoles, ClientInfo, RequestContext, Subject, Viewer};
pub use types::{DocumentId, UserId};

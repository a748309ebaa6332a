//! # Report Gate Testkit
//!
//! Testing utilities for Report Gate.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Scenarios**: Named policy cases with expected decisions
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A populated gate over in-memory collaborators
//!
//! ## Scenarios
//!
//! ```rust,no_run
//! use report_gate_testkit::scenarios::{all_scenarios, run_scenario};
//!
//! async fn check() {
//!     for scenario in all_scenarios() {
//!         let outcome = run_scenario(&scenario).await;
//!         assert!(outcome.matches(&scenario), "{}", scenario.name);
//!     }
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use report_gate_testkit::generators::{expected_decision, PolicyCase};
//!
//! proptest! {
//!     #[test]
//!     fn matches_oracle(case: PolicyCase) {
//!         // evaluate case and compare with expected_decision(&case)
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use report_gate_testkit::fixtures::TestFixture;
//!
//! async fn fetch() {
//!     let fixture = TestFixture::new();
//!     let pdf = fixture
//!         .gate
//!         .fetch_report(&fixture.parent(), "student2", TestFixture::REPORT_A)
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use fixtures::{RejectingAuditLog, StaticDocumentSource, TestFixture};
pub use generators::{expected_decision, PolicyCase};
pub use scenarios::{all_scenarios, run_scenario, verify_all_scenarios, Scenario, ScenarioOutcome};

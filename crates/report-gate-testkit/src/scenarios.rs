//! Named policy scenarios with expected outcomes.
//!
//! Each scenario runs against the [`school_directory`] population, so the
//! ids and usernames match [`TestFixture`](crate::TestFixture).

use std::sync::Arc;

use report_gate_core::{Decision, Reason, Viewer};
use report_gate_policy::{AccessPolicy, PolicyConfig, PolicyError, StaffAccess};
use report_gate_store::{AuditEntry, AuditLog, MemoryAuditLog};

use crate::fixtures::{context, school_directory};

/// A named policy scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Human-readable name for the scenario.
    pub name: &'static str,
    pub viewer: Viewer,
    pub subject_username: &'static str,
    pub staff_access: StaffAccess,
    /// `None` means the subject must be rejected as invalid.
    pub expected: Option<Decision>,
}

/// What a scenario produced.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// `None` when evaluation returned an error.
    pub decision: Option<Decision>,
    pub error: Option<PolicyError>,
    pub entries: Vec<AuditEntry>,
}

impl ScenarioOutcome {
    /// Whether the outcome is what the scenario expects, with exactly one
    /// matching audit entry.
    pub fn matches(&self, scenario: &Scenario) -> bool {
        let [entry] = self.entries.as_slice() else {
            return false;
        };
        match (scenario.expected, self.decision, &self.error) {
            (Some(expected), Some(actual), None) => {
                expected == actual && entry.decision.decision() == expected
            }
            (None, None, Some(PolicyError::InvalidSubject(_))) => {
                !entry.decision.granted && entry.decision.reason == Reason::InvalidSubject
            }
            _ => false,
        }
    }
}

/// Get all scenarios.
pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "admin views another student",
            viewer: Viewer::new(1, "admin1").admin(),
            subject_username: "student2",
            staff_access: StaffAccess::Deny,
            expected: Some(Decision::grant(Reason::AdminAccess)),
        },
        Scenario {
            name: "student views own reports",
            viewer: Viewer::new(2, "student2"),
            subject_username: "student2",
            staff_access: StaffAccess::Deny,
            expected: Some(Decision::grant(Reason::SelfAccess)),
        },
        Scenario {
            name: "admin views own profile",
            viewer: Viewer::new(1, "admin1").admin(),
            subject_username: "admin1",
            staff_access: StaffAccess::Deny,
            expected: Some(Decision::grant(Reason::SelfAccess)),
        },
        Scenario {
            name: "stranger is refused",
            viewer: Viewer::new(3, "stranger3"),
            subject_username: "student2",
            staff_access: StaffAccess::Deny,
            expected: Some(Decision::deny(Reason::InsufficientPermissions)),
        },
        Scenario {
            name: "parent views child",
            viewer: Viewer::new(4, "parent4"),
            subject_username: "student2",
            staff_access: StaffAccess::Deny,
            expected: Some(Decision::grant(Reason::MentorAccess)),
        },
        Scenario {
            name: "mentor role does not cover other students",
            viewer: Viewer::new(4, "parent4"),
            subject_username: "junior6",
            staff_access: StaffAccess::Deny,
            expected: Some(Decision::deny(Reason::InsufficientPermissions)),
        },
        Scenario {
            name: "staff refused by default",
            viewer: Viewer::new(5, "teacher5").with_campus_roles("Senior School:Staff"),
            subject_username: "student2",
            staff_access: StaffAccess::Deny,
            expected: Some(Decision::deny(Reason::InsufficientPermissions)),
        },
        Scenario {
            name: "staff allowed when configured",
            viewer: Viewer::new(5, "teacher5").with_campus_roles("Senior School:Staff"),
            subject_username: "student2",
            staff_access: StaffAccess::Allow,
            expected: Some(Decision::grant(Reason::StaffAccess)),
        },
        Scenario {
            name: "unknown student",
            viewer: Viewer::new(1, "admin1").admin(),
            subject_username: "nobody",
            staff_access: StaffAccess::Deny,
            expected: None,
        },
    ]
}

/// Evaluate a scenario against a fresh policy and log.
pub async fn run_scenario(scenario: &Scenario) -> ScenarioOutcome {
    let log = Arc::new(MemoryAuditLog::new());
    let config = PolicyConfig {
        staff_access: scenario.staff_access,
    };
    let policy = AccessPolicy::new(school_directory(), Arc::clone(&log), config);

    let result = policy
        .evaluate(&context(scenario.viewer.clone()), scenario.subject_username)
        .await;
    let entries = log.entries().await.unwrap_or_default();

    match result {
        Ok(decision) => ScenarioOutcome {
            decision: Some(decision),
            error: None,
            entries,
        },
        Err(e) => ScenarioOutcome {
            decision: None,
            error: Some(e),
            entries,
        },
    }
}

/// Run every scenario; returns `(name, passed, outcome)` triples.
pub async fn verify_all_scenarios() -> Vec<(String, bool, String)> {
    let mut results = Vec::new();
    for scenario in all_scenarios() {
        let outcome = run_scenario(&scenario).await;
        let summary = match (&outcome.decision, &outcome.error) {
            (Some(d), _) => format!("granted={} reason={}", d.granted, d.reason),
            (None, Some(e)) => format!("error: {}", e),
            (None, None) => "no outcome".to_string(),
        };
        results.push((scenario.name.to_string(), outcome.matches(&scenario), summary));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_names_unique() {
        let scenarios = all_scenarios();
        let mut names: Vec<_> = scenarios.iter().map(|s| s.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), scenarios.len());
    }

    #[tokio::test]
    async fn test_all_scenarios_pass() {
        for (name, passed, summary) in verify_all_scenarios().await {
            assert!(passed, "{}: {}", name, summary);
        }
    }

    #[tokio::test]
    async fn test_stranger_leaves_one_denied_row() {
        let scenario = all_scenarios()
            .into_iter()
            .find(|s| s.name == "stranger is refused")
            .unwrap();
        let outcome = run_scenario(&scenario).await;

        assert_eq!(outcome.entries.len(), 1);
        let row = &outcome.entries[0].decision;
        assert!(!row.granted);
        assert_eq!(row.reason, Reason::InsufficientPermissions);
        assert_eq!(row.viewer_id.get(), 3);
        assert_eq!(row.subject_username, "student2");
        assert_eq!(row.client_ip.as_deref(), Some("10.0.0.7"));
    }
}

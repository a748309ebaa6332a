//! Proptest generators for property-based testing.

use std::sync::Arc;

use proptest::prelude::*;

use report_gate_core::{Decision, Reason, Subject, UserId, Viewer};
use report_gate_policy::{AccessPolicy, InMemoryDirectory, PolicyConfig, StaffAccess};
use report_gate_store::MemoryAuditLog;

/// Generate a user id from a small range so viewer and subject collide often.
pub fn user_id() -> impl Strategy<Value = UserId> {
    (1u64..=6).prop_map(UserId)
}

/// Generate a username in the host's format.
pub fn username() -> impl Strategy<Value = String> {
    "[a-z]{3,10}[0-9]{0,3}"
}

/// Generate a campus role string.
pub fn campus_roles() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("Senior School:Students".to_string()),
        Just("Junior School:Students".to_string()),
        Just("Senior School:Staff".to_string()),
        Just("staff".to_string()),
        Just("Staffroom:Visitors".to_string()),
    ]
}

/// Generate a staff setting.
pub fn staff_access() -> impl Strategy<Value = StaffAccess> {
    prop_oneof![Just(StaffAccess::Deny), Just(StaffAccess::Allow)]
}

/// One policy evaluation, fully described.
#[derive(Debug, Clone)]
pub struct PolicyCase {
    pub viewer_id: UserId,
    pub viewer_admin: bool,
    pub viewer_roles: String,
    pub subject_id: UserId,
    pub mentor: bool,
    pub staff_access: StaffAccess,
    /// When false the subject is missing from the directory.
    pub subject_exists: bool,
}

impl PolicyCase {
    pub const SUBJECT_USERNAME: &'static str = "subject";

    pub fn viewer(&self) -> Viewer {
        let viewer = Viewer::new(self.viewer_id, format!("viewer{}", self.viewer_id))
            .with_campus_roles(self.viewer_roles.clone());
        if self.viewer_admin {
            viewer.admin()
        } else {
            viewer
        }
    }

    /// A policy whose directory matches the case.
    pub fn policy(&self) -> AccessPolicy<InMemoryDirectory, MemoryAuditLog> {
        let directory = InMemoryDirectory::new();
        if self.subject_exists {
            directory
                .add_user(Subject::new(self.subject_id, Self::SUBJECT_USERNAME))
                .expect("fresh directory");
        }
        if self.mentor {
            directory
                .add_mentor(self.viewer_id, self.subject_id)
                .expect("fresh directory");
        }
        let config = PolicyConfig {
            staff_access: self.staff_access,
        };
        AccessPolicy::new(directory, Arc::new(MemoryAuditLog::new()), config)
    }
}

impl Arbitrary for PolicyCase {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            user_id(),
            any::<bool>(),
            campus_roles(),
            user_id(),
            any::<bool>(),
            staff_access(),
            prop::bool::weighted(0.9),
        )
            .prop_map(
                |(viewer_id, viewer_admin, viewer_roles, subject_id, mentor, staff_access, subject_exists)| {
                    PolicyCase {
                        viewer_id,
                        viewer_admin,
                        viewer_roles,
                        subject_id,
                        mentor,
                        staff_access,
                        subject_exists,
                    }
                },
            )
            .boxed()
    }
}

/// The decision the rules require for a case, or `None` for an invalid subject.
pub fn expected_decision(case: &PolicyCase) -> Option<Decision> {
    if !case.subject_exists {
        return None;
    }
    let self_access = case.viewer_id == case.subject_id;
    let decision = if case.viewer_admin && !self_access {
        Decision::grant(Reason::AdminAccess)
    } else if self_access {
        Decision::grant(Reason::SelfAccess)
    } else if case.mentor {
        Decision::grant(Reason::MentorAccess)
    } else if case.staff_access == StaffAccess::Allow && case.viewer().is_staff() {
        Decision::grant(Reason::StaffAccess)
    } else {
        Decision::deny(Reason::InsufficientPermissions)
    };
    Some(decision)
}

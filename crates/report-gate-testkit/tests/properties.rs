//! Property tests for the access policy.

use proptest::prelude::*;

use report_gate_core::{Reason, RequestContext};
use report_gate_policy::PolicyError;
use report_gate_store::AuditLog;
use report_gate_testkit::generators::{expected_decision, PolicyCase};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn decision_follows_rules(case: PolicyCase) {
        let rt = runtime();
        let policy = case.policy();
        let ctx = RequestContext::new(case.viewer());

        let result = rt.block_on(policy.evaluate(&ctx, PolicyCase::SUBJECT_USERNAME));

        match expected_decision(&case) {
            Some(expected) => {
                prop_assert_eq!(result.unwrap(), expected);
            }
            None => {
                prop_assert!(matches!(result, Err(PolicyError::InvalidSubject(_))));
            }
        }
    }

    #[test]
    fn every_evaluation_leaves_one_matching_entry(case: PolicyCase) {
        let rt = runtime();
        let policy = case.policy();
        let ctx = RequestContext::new(case.viewer());

        let result = rt.block_on(policy.evaluate(&ctx, PolicyCase::SUBJECT_USERNAME));
        let entries = rt.block_on(policy.log().entries()).unwrap();

        prop_assert_eq!(entries.len(), 1);
        let row = &entries[0].decision;
        prop_assert_eq!(row.viewer_id, case.viewer_id);
        prop_assert_eq!(row.subject_username.as_str(), PolicyCase::SUBJECT_USERNAME);
        match result {
            Ok(decision) => {
                prop_assert_eq!(row.decision(), decision);
            }
            Err(_) => {
                prop_assert!(!row.granted);
                prop_assert_eq!(row.reason, Reason::InvalidSubject);
            }
        }
    }

    #[test]
    fn missing_subject_is_never_granted(case: PolicyCase) {
        let mut case = case;
        case.subject_exists = false;
        case.viewer_admin = true;
        let rt = runtime();
        let policy = case.policy();
        let ctx = RequestContext::new(case.viewer());

        let result = rt.block_on(policy.evaluate(&ctx, PolicyCase::SUBJECT_USERNAME));
        prop_assert!(result.is_err());

        let entries = rt.block_on(policy.log().entries()).unwrap();
        prop_assert!(entries.iter().all(|e| !e.decision.granted));
    }

    #[test]
    fn decide_never_writes(case: PolicyCase) {
        let rt = runtime();
        let policy = case.policy();

        let _ = rt.block_on(policy.decide(&case.viewer(), PolicyCase::SUBJECT_USERNAME));
        prop_assert_eq!(rt.block_on(policy.log().count()).unwrap(), 0);
    }

    #[test]
    fn self_access_wins_over_admin(case: PolicyCase) {
        prop_assume!(case.subject_exists);
        let mut case = case;
        case.subject_id = case.viewer_id;
        let rt = runtime();
        let policy = case.policy();
        let ctx = RequestContext::new(case.viewer());

        let decision = rt
            .block_on(policy.evaluate(&ctx, PolicyCase::SUBJECT_USERNAME))
            .unwrap();
        prop_assert!(decision.granted);
        prop_assert_eq!(decision.reason, Reason::SelfAccess);
    }
}

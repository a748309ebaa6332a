//! The access policy.
//!
//! [`AccessPolicy::decide`] is the pure rule evaluation. Everything callers
//! use goes through [`AccessPolicy::evaluate`] (or a caller that pairs
//! `decide` with exactly one [`AccessPolicy::record`]), so each attempt
//! leaves one audit entry behind.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use report_gate_core::{AccessDecision, Decision, DocumentRef, Reason, RequestContext, Subject, Viewer};
use report_gate_store::AuditLog;

use crate::directory::Directory;
use crate::error::{PolicyError, Result};

/// Whether campus staff may see any student's reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffAccess {
    /// Staff get no special treatment.
    #[default]
    Deny,
    /// Staff are granted after the admin, self and mentor rules.
    Allow,
}

/// Configuration for the policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub staff_access: StaffAccess,
}

/// The access policy.
pub struct AccessPolicy<D: Directory, L: AuditLog> {
    directory: D,
    log: Arc<L>,
    config: PolicyConfig,
}

impl<D: Directory, L: AuditLog> AccessPolicy<D, L> {
    /// Create a new policy writing to `log`.
    pub fn new(directory: D, log: Arc<L>, config: PolicyConfig) -> Self {
        Self {
            directory,
            log,
            config,
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Evaluate and record, with no particular document in view.
    pub async fn evaluate(&self, ctx: &RequestContext, subject_username: &str) -> Result<Decision> {
        self.evaluate_for(ctx, subject_username, DocumentRef::None)
            .await
            .map(|(_, decision)| decision)
    }

    /// Evaluate and record for a specific document reference.
    ///
    /// Exactly one audit entry is written, including when the subject does
    /// not resolve or a lookup fails.
    pub async fn evaluate_for(
        &self,
        ctx: &RequestContext,
        subject_username: &str,
        document: DocumentRef,
    ) -> Result<(Subject, Decision)> {
        match self.decide(&ctx.viewer, subject_username).await {
            Ok((subject, decision)) => {
                self.record(ctx, subject_username, document, decision).await;
                Ok((subject, decision))
            }
            Err(e) => {
                self.record_failure(ctx, subject_username, document, &e).await;
                Err(e)
            }
        }
    }

    /// Apply the rules without writing anything.
    pub async fn decide(&self, viewer: &Viewer, subject_username: &str) -> Result<(Subject, Decision)> {
        let subject = self
            .directory
            .resolve_user(subject_username)
            .await?
            .ok_or_else(|| PolicyError::InvalidSubject(subject_username.to_string()))?;

        let decision = self.decide_for_subject(viewer, &subject).await?;
        Ok((subject, decision))
    }

    async fn decide_for_subject(&self, viewer: &Viewer, subject: &Subject) -> Result<Decision> {
        let is_self = viewer.id == subject.id;

        if viewer.is_admin && !is_self {
            return Ok(Decision::grant(Reason::AdminAccess));
        }

        if is_self {
            return Ok(Decision::grant(Reason::SelfAccess));
        }

        if self.directory.has_mentor_role(viewer.id, subject.id).await? {
            return Ok(Decision::grant(Reason::MentorAccess));
        }

        if self.config.staff_access == StaffAccess::Allow && viewer.is_staff() {
            return Ok(Decision::grant(Reason::StaffAccess));
        }

        Ok(Decision::deny(Reason::InsufficientPermissions))
    }

    /// Append one decision to the audit log.
    ///
    /// Best-effort: a write failure is reported through `tracing` and
    /// swallowed, the decision stands.
    pub async fn record(
        &self,
        ctx: &RequestContext,
        subject_username: &str,
        document: DocumentRef,
        decision: Decision,
    ) {
        let record = AccessDecision::new(ctx, subject_username, document, decision, now_millis());

        if !decision.granted {
            tracing::warn!(
                viewer = %ctx.viewer.username,
                subject = %subject_username,
                document = %record.document,
                reason = %decision.reason,
                "report access denied"
            );
        }

        match self.log.record(&record).await {
            Ok(entry) => {
                tracing::debug!(
                    seq = entry.seq,
                    viewer = %ctx.viewer.username,
                    subject = %subject_username,
                    granted = decision.granted,
                    reason = %decision.reason,
                    "access decision recorded"
                );
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    viewer = %ctx.viewer.username,
                    subject = %subject_username,
                    granted = decision.granted,
                    reason = %decision.reason,
                    "failed to write access decision to audit log"
                );
            }
        }
    }

    /// Record a failed evaluation as a denial.
    pub async fn record_failure(
        &self,
        ctx: &RequestContext,
        subject_username: &str,
        document: DocumentRef,
        error: &PolicyError,
    ) {
        self.record(ctx, subject_username, document, Decision::deny(error.reason()))
            .await;
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryError, InMemoryDirectory};
    use async_trait::async_trait;
    use report_gate_core::{ClientInfo, UserId};
    use report_gate_store::MemoryAuditLog;

    fn directory() -> InMemoryDirectory {
        let dir = InMemoryDirectory::new();
        dir.add_user(Subject::new(1, "admin1")).unwrap();
        dir.add_user(Subject::new(2, "student2")).unwrap();
        dir.add_user(Subject::new(3, "stranger3")).unwrap();
        dir.add_user(Subject::new(4, "parent4")).unwrap();
        dir.add_mentor(UserId(4), UserId(2)).unwrap();
        dir
    }

    fn policy(config: PolicyConfig) -> AccessPolicy<InMemoryDirectory, MemoryAuditLog> {
        AccessPolicy::new(directory(), Arc::new(MemoryAuditLog::new()), config)
    }

    fn ctx(viewer: Viewer) -> RequestContext {
        RequestContext::new(viewer).with_client(ClientInfo::new("10.1.1.1", "test-agent"))
    }

    #[tokio::test]
    async fn test_admin_access() {
        let p = policy(PolicyConfig::default());
        let d = p
            .evaluate(&ctx(Viewer::new(1, "admin1").admin()), "student2")
            .await
            .unwrap();
        assert_eq!(d, Decision::grant(Reason::AdminAccess));
    }

    #[tokio::test]
    async fn test_self_access_regardless_of_admin() {
        let p = policy(PolicyConfig::default());
        let plain = p
            .evaluate(&ctx(Viewer::new(2, "student2")), "student2")
            .await
            .unwrap();
        assert_eq!(plain, Decision::grant(Reason::SelfAccess));

        let admin_self = p
            .evaluate(&ctx(Viewer::new(1, "admin1").admin()), "admin1")
            .await
            .unwrap();
        assert_eq!(admin_self, Decision::grant(Reason::SelfAccess));
    }

    #[tokio::test]
    async fn test_mentor_access() {
        let p = policy(PolicyConfig::default());
        let d = p
            .evaluate(&ctx(Viewer::new(4, "parent4")), "student2")
            .await
            .unwrap();
        assert_eq!(d, Decision::grant(Reason::MentorAccess));

        // The relationship is directional.
        let d = p
            .evaluate(&ctx(Viewer::new(2, "student2")), "parent4")
            .await
            .unwrap();
        assert_eq!(d, Decision::deny(Reason::InsufficientPermissions));
    }

    #[tokio::test]
    async fn test_stranger_denied_and_logged_once() {
        let p = policy(PolicyConfig::default());
        let d = p
            .evaluate(&ctx(Viewer::new(3, "stranger3")), "student2")
            .await
            .unwrap();
        assert_eq!(d, Decision::deny(Reason::InsufficientPermissions));

        let entries = p.log().entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        let record = &entries[0].decision;
        assert!(!record.granted);
        assert_eq!(record.reason, Reason::InsufficientPermissions);
        assert_eq!(record.viewer_id, UserId(3));
        assert_eq!(record.subject_username, "student2");
        assert_eq!(record.client_ip.as_deref(), Some("10.1.1.1"));
        assert_eq!(record.client_agent.as_deref(), Some("test-agent"));
    }

    #[tokio::test]
    async fn test_staff_rule_follows_config() {
        let staff = Viewer::new(3, "stranger3").with_campus_roles("Senior School:Staff");

        let deny = policy(PolicyConfig::default());
        assert_eq!(
            deny.evaluate(&ctx(staff.clone()), "student2").await.unwrap(),
            Decision::deny(Reason::InsufficientPermissions)
        );

        let allow = policy(PolicyConfig {
            staff_access: StaffAccess::Allow,
        });
        assert_eq!(
            allow.evaluate(&ctx(staff), "student2").await.unwrap(),
            Decision::grant(Reason::StaffAccess)
        );
    }

    #[tokio::test]
    async fn test_invalid_subject_logged_as_denial() {
        let p = policy(PolicyConfig::default());
        let err = p
            .evaluate(&ctx(Viewer::new(1, "admin1").admin()), "ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidSubject(ref u) if u == "ghost"));

        let entries = p.log().entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].decision.granted);
        assert_eq!(entries[0].decision.reason, Reason::InvalidSubject);
    }

    #[tokio::test]
    async fn test_decide_writes_nothing() {
        let p = policy(PolicyConfig::default());
        p.decide(&Viewer::new(3, "stranger3"), "student2")
            .await
            .unwrap();
        assert_eq!(p.log().count().await.unwrap(), 0);
    }

    #[test]
    fn test_config_from_json() {
        let cfg: PolicyConfig = serde_json::from_str(r#"{"staff_access":"allow"}"#).unwrap();
        assert_eq!(cfg.staff_access, StaffAccess::Allow);
        let cfg: PolicyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.staff_access, StaffAccess::Deny);
    }

    struct BrokenDirectory;

    #[async_trait]
    impl Directory for BrokenDirectory {
        async fn resolve_user(&self, username: &str) -> std::result::Result<Option<Subject>, DirectoryError> {
            Ok(Some(Subject::new(2, username)))
        }

        async fn has_mentor_role(
            &self,
            _viewer: UserId,
            _subject: UserId,
        ) -> std::result::Result<bool, DirectoryError> {
            Err(DirectoryError::new("role table unavailable"))
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_a_grant() {
        let p = AccessPolicy::new(
            BrokenDirectory,
            Arc::new(MemoryAuditLog::new()),
            PolicyConfig::default(),
        );
        let err = p
            .evaluate(&ctx(Viewer::new(3, "stranger3")), "student2")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::Directory(_)));

        let entries = p.log().entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].decision.granted);
        assert_eq!(entries[0].decision.reason, Reason::LookupFailed);
    }

    struct RejectingLog;

    #[async_trait]
    impl AuditLog for RejectingLog {
        async fn record(
            &self,
            _decision: &AccessDecision,
        ) -> report_gate_store::Result<report_gate_store::AuditEntry> {
            Err(report_gate_store::StoreError::WriteRejected("disk full".into()))
        }

        async fn entries(&self) -> report_gate_store::Result<Vec<report_gate_store::AuditEntry>> {
            Ok(Vec::new())
        }

        async fn entries_for_subject(
            &self,
            _subject_username: &str,
        ) -> report_gate_store::Result<Vec<report_gate_store::AuditEntry>> {
            Ok(Vec::new())
        }

        async fn entries_for_viewer(
            &self,
            _viewer_id: UserId,
        ) -> report_gate_store::Result<Vec<report_gate_store::AuditEntry>> {
            Ok(Vec::new())
        }

        async fn count(&self) -> report_gate_store::Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_log_failure_does_not_change_decision() {
        let p = AccessPolicy::new(directory(), Arc::new(RejectingLog), PolicyConfig::default());

        let granted = p
            .evaluate(&ctx(Viewer::new(4, "parent4")), "student2")
            .await
            .unwrap();
        assert_eq!(granted, Decision::grant(Reason::MentorAccess));

        let denied = p
            .evaluate(&ctx(Viewer::new(3, "stranger3")), "student2")
            .await
            .unwrap();
        assert_eq!(denied, Decision::deny(Reason::InsufficientPermissions));
    }

    #[tokio::test]
    async fn test_unstorable_record_leaves_log_readable() {
        use report_gate_store::AuditLogExt;

        let p = policy(PolicyConfig::default());
        let c = ctx(Viewer::new(4, "parent4"));
        p.record(&c, "student2", DocumentRef::Batch(Vec::new()), Decision::grant(Reason::MentorAccess))
            .await;
        p.evaluate(&c, "student2").await.unwrap();

        let entries = p.log().entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].decision.document, DocumentRef::None);
        assert!(p.log().verify_chain().await.unwrap().is_intact());
    }
}

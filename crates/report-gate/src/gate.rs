//! The gate: unified API for report retrieval.
//!
//! Brings the policy, the audit log and the report source together. Every
//! path that can reach the source first writes exactly one audit entry.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;

use report_gate_core::{Decision, DocumentId, DocumentRef, Reason, RequestContext, Subject};
use report_gate_policy::{AccessPolicy, Directory};
use report_gate_store::{AuditEntry, AuditLog, AuditLogExt, ChainStatus};

use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::source::{DocumentSource, ReportFile};
use crate::widget::ProfileWidget;

/// The main gate struct.
///
/// Provides:
/// - Policy evaluation for a student profile
/// - Single and bundled report fetches
/// - Profile widget data
/// - Audit trail queries
pub struct ReportGate<D: Directory, L: AuditLog, S: DocumentSource> {
    policy: AccessPolicy<D, L>,
    log: Arc<L>,
    source: S,
    config: GateConfig,
}

impl<D: Directory, L: AuditLog, S: DocumentSource> ReportGate<D, L, S> {
    /// Create a new gate.
    pub fn new(directory: D, log: L, source: S, config: GateConfig) -> Self {
        let log = Arc::new(log);
        Self {
            policy: AccessPolicy::new(directory, Arc::clone(&log), config.policy.clone()),
            log,
            source,
            config,
        }
    }

    pub fn policy(&self) -> &AccessPolicy<D, L> {
        &self.policy
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Policy
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluate the policy for a student profile (logged).
    pub async fn evaluate(&self, ctx: &RequestContext, subject_username: &str) -> Result<Decision> {
        Ok(self.policy.evaluate(ctx, subject_username).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Retrieval
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch one report.
    pub async fn fetch_report(
        &self,
        ctx: &RequestContext,
        subject_username: &str,
        id: DocumentId,
    ) -> Result<Bytes> {
        self.authorize(ctx, subject_username, DocumentRef::Single(id))
            .await?;

        Ok(self.source.fetch_document(id).await?)
    }

    /// Fetch a bundle of reports.
    ///
    /// `ids` is a comma-delimited list or a JSON array. Every id must belong
    /// to the student; one audit entry covers the whole bundle.
    pub async fn fetch_reports(
        &self,
        ctx: &RequestContext,
        subject_username: &str,
        ids: &str,
    ) -> Result<Vec<ReportFile>> {
        let document = DocumentRef::parse_list(ids)?;
        let requested = document.ids().to_vec();

        self.authorize(ctx, subject_username, document).await?;

        let files = self.source.fetch_documents(&requested).await?;
        tracing::debug!(
            subject = %subject_username,
            requested = requested.len(),
            returned = files.len(),
            "report bundle fetched"
        );
        Ok(files)
    }

    /// Decide, check ownership, and write the single audit entry.
    async fn authorize(
        &self,
        ctx: &RequestContext,
        subject_username: &str,
        document: DocumentRef,
    ) -> Result<()> {
        let (subject, decision) = match self.policy.decide(&ctx.viewer, subject_username).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.policy
                    .record_failure(ctx, subject_username, document, &e)
                    .await;
                return Err(e.into());
            }
        };

        let decision = if decision.granted {
            let owned = self.owns_all(ctx, &subject, &document).await;
            match owned {
                Ok(true) => decision,
                Ok(false) => Decision::deny(Reason::DocumentNotOwned),
                Err(e) => {
                    self.policy
                        .record(
                            ctx,
                            subject_username,
                            document,
                            Decision::deny(Reason::LookupFailed),
                        )
                        .await;
                    return Err(e);
                }
            }
        } else {
            decision
        };

        self.policy
            .record(ctx, subject_username, document, decision)
            .await;

        if decision.granted {
            Ok(())
        } else {
            Err(GateError::AccessDenied(decision.reason))
        }
    }

    /// Whether every requested id is among the student's listed reports.
    async fn owns_all(
        &self,
        ctx: &RequestContext,
        subject: &Subject,
        document: &DocumentRef,
    ) -> Result<bool> {
        let listed: HashSet<DocumentId> = self
            .source
            .list_reports(&subject.username, &ctx.viewer.username)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        Ok(document.ids().iter().all(|id| listed.contains(id)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profile widget
    // ─────────────────────────────────────────────────────────────────────────

    /// Rows for the profile widget, or `None` when it should not be shown.
    ///
    /// Hidden when the page is not the configured profile page, when the
    /// viewer is denied, or when the student is not in the eligible campus
    /// role.
    pub async fn profile_widget(
        &self,
        ctx: &RequestContext,
        subject_username: &str,
    ) -> Result<Option<ProfileWidget>> {
        if let Some(profile_path) = &self.config.profile_path {
            if ctx.page_path.as_deref() != Some(profile_path.as_str()) {
                return Ok(None);
            }
        }

        let (subject, decision) = self
            .policy
            .evaluate_for(ctx, subject_username, DocumentRef::None)
            .await?;
        if !decision.granted {
            return Ok(None);
        }

        if let Some(role) = &self.config.eligible_campus_role {
            if !subject.campus_roles.is(role) {
                return Ok(None);
            }
        }

        let reports = self
            .source
            .list_reports(&subject.username, &ctx.viewer.username)
            .await?;

        Ok(Some(ProfileWidget::from_reports(
            &subject.username,
            reports,
            &self.config.date_format,
        )))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Audit
    // ─────────────────────────────────────────────────────────────────────────

    /// Every recorded decision about a student.
    pub async fn audit_trail(&self, subject_username: &str) -> Result<Vec<AuditEntry>> {
        Ok(self.log.entries_for_subject(subject_username).await?)
    }

    /// Walk the audit hash chain.
    pub async fn verify_audit_chain(&self) -> Result<ChainStatus> {
        Ok(self.log.verify_chain().await?)
    }
}

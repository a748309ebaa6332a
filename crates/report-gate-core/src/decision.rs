//! Policy outcomes and the audit record built from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::DocumentRef;
use crate::error::CoreError;
use crate::identity::RequestContext;
use crate::types::UserId;

/// Why a decision came out the way it did.
///
/// The string forms are what operators see in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    AdminAccess,
    SelfAccess,
    MentorAccess,
    StaffAccess,
    InsufficientPermissions,
    InvalidSubject,
    LookupFailed,
    DocumentNotOwned,
}

impl Reason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AdminAccess => "admin access",
            Self::SelfAccess => "self access",
            Self::MentorAccess => "mentor access",
            Self::StaffAccess => "staff access",
            Self::InsufficientPermissions => "insufficient permissions",
            Self::InvalidSubject => "invalid student username",
            Self::LookupFailed => "lookup failed",
            Self::DocumentNotOwned => "document not owned by subject",
        }
    }

    /// All reasons, in a stable order.
    pub const ALL: [Reason; 8] = [
        Self::AdminAccess,
        Self::SelfAccess,
        Self::MentorAccess,
        Self::StaffAccess,
        Self::InsufficientPermissions,
        Self::InvalidSubject,
        Self::LookupFailed,
        Self::DocumentNotOwned,
    ];

    /// Whether this reason ever accompanies a grant.
    pub const fn is_grant_reason(&self) -> bool {
        matches!(
            self,
            Self::AdminAccess | Self::SelfAccess | Self::MentorAccess | Self::StaffAccess
        )
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reason {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CoreError::UnknownReason(s.to_string()))
    }
}

/// A grant or deny plus its reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub granted: bool,
    pub reason: Reason,
}

impl Decision {
    pub const fn grant(reason: Reason) -> Self {
        Self {
            granted: true,
            reason,
        }
    }

    pub const fn deny(reason: Reason) -> Self {
        Self {
            granted: false,
            reason,
        }
    }

    pub const fn is_granted(&self) -> bool {
        self.granted
    }
}

/// One row of the audit log.
///
/// Built once per access attempt and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub viewer_id: UserId,
    pub viewer_username: String,
    pub subject_username: String,
    pub document: DocumentRef,
    pub granted: bool,
    pub reason: Reason,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub client_ip: Option<String>,
    pub client_agent: Option<String>,
}

impl AccessDecision {
    /// Build the record for `decision` taken in `ctx`.
    pub fn new(
        ctx: &RequestContext,
        subject_username: &str,
        document: DocumentRef,
        decision: Decision,
        timestamp: i64,
    ) -> Self {
        Self {
            viewer_id: ctx.viewer.id,
            viewer_username: ctx.viewer.username.clone(),
            subject_username: subject_username.to_string(),
            document,
            granted: decision.granted,
            reason: decision.reason,
            timestamp,
            client_ip: ctx.client.ip.clone(),
            client_agent: ctx.client.user_agent.clone(),
        }
    }

    /// The decision this record captures.
    pub fn decision(&self) -> Decision {
        Decision {
            granted: self.granted,
            reason: self.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ClientInfo, Viewer};
    use crate::types::DocumentId;

    #[test]
    fn test_reason_strings_roundtrip() {
        for reason in Reason::ALL {
            assert_eq!(reason.as_str().parse::<Reason>().unwrap(), reason);
        }
        assert!("nope".parse::<Reason>().is_err());
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(Reason::AdminAccess.to_string(), "admin access");
        assert_eq!(Reason::SelfAccess.to_string(), "self access");
        assert_eq!(Reason::MentorAccess.to_string(), "mentor access");
        assert_eq!(
            Reason::InsufficientPermissions.to_string(),
            "insufficient permissions"
        );
        assert_eq!(Reason::InvalidSubject.to_string(), "invalid student username");
    }

    #[test]
    fn test_record_copies_context() {
        let ctx = RequestContext::new(Viewer::new(5, "mum"))
            .with_client(ClientInfo::new("10.0.0.1", "Firefox"));
        let record = AccessDecision::new(
            &ctx,
            "kid",
            DocumentRef::Single(DocumentId(77)),
            Decision::grant(Reason::MentorAccess),
            1_700_000_000_000,
        );

        assert_eq!(record.viewer_id, UserId(5));
        assert_eq!(record.viewer_username, "mum");
        assert_eq!(record.subject_username, "kid");
        assert!(record.granted);
        assert_eq!(record.client_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(record.client_agent.as_deref(), Some("Firefox"));
        assert_eq!(record.decision(), Decision::grant(Reason::MentorAccess));
    }
}

//! Gate configuration.
//!
//! Plain struct with defaults. Hosts that keep settings as JSON can use
//! [`GateConfig::from_json`]; missing fields fall back to the defaults.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use report_gate_policy::PolicyConfig;

use crate::error::{GateError, Result};

/// Campus role of the students whose profiles show the widget.
pub const DEFAULT_ELIGIBLE_CAMPUS_ROLE: &str = "Senior School:Students";

/// Day/month/year, as shown in the widget.
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Configuration for the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Policy rules.
    pub policy: PolicyConfig,
    /// Only render the widget on this page path, when set.
    pub profile_path: Option<String>,
    /// Only render the widget for students with exactly this campus role,
    /// when set.
    pub eligible_campus_role: Option<String>,
    /// strftime pattern for report dates.
    pub date_format: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            profile_path: None,
            eligible_campus_role: Some(DEFAULT_ELIGIBLE_CAMPUS_ROLE.to_string()),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl GateConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GateConfig =
            serde_json::from_str(json).map_err(|e| GateError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would fail at render time.
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(GateError::Config(format!(
                "invalid date format: {}",
                self.date_format
            )));
        }
        if matches!(self.profile_path.as_deref(), Some("")) {
            return Err(GateError::Config("profile_path is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_gate_policy::StaffAccess;

    #[test]
    fn test_defaults() {
        let cfg = GateConfig::default();
        assert_eq!(cfg.policy.staff_access, StaffAccess::Deny);
        assert_eq!(
            cfg.eligible_campus_role.as_deref(),
            Some("Senior School:Students")
        );
        assert_eq!(cfg.date_format, "%d/%m/%Y");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let cfg = GateConfig::from_json(
            r#"{"profile_path":"/user/profile.php","policy":{"staff_access":"allow"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.profile_path.as_deref(), Some("/user/profile.php"));
        assert_eq!(cfg.policy.staff_access, StaffAccess::Allow);
        assert_eq!(cfg.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            GateConfig::from_json("not json"),
            Err(GateError::Config(_))
        ));
        assert!(matches!(
            GateConfig::from_json(r#"{"date_format":"%Q"}"#),
            Err(GateError::Config(_))
        ));
        assert!(matches!(
            GateConfig::from_json(r#"{"profile_path":""}"#),
            Err(GateError::Config(_))
        ));
    }

    #[test]
    fn test_eligibility_can_be_disabled() {
        let cfg = GateConfig::from_json(r#"{"eligible_campus_role":null}"#).unwrap();
        assert_eq!(cfg.eligible_campus_role, None);
    }
}

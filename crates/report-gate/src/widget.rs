//! Profile widget data.
//!
//! The host renders the widget; this module only shapes the rows.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use report_gate_core::DocumentId;

use crate::source::ReportDescriptor;

/// One row of the widget table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetRow {
    pub document_id: DocumentId,
    pub description: String,
    /// Created date, already formatted.
    pub created: String,
}

/// Everything the host template needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileWidget {
    pub subject_username: String,
    pub rows: Vec<WidgetRow>,
}

impl ProfileWidget {
    /// Shape listed reports into rows, in listing order.
    pub fn from_reports(
        subject_username: &str,
        reports: Vec<ReportDescriptor>,
        date_format: &str,
    ) -> Self {
        let rows = reports
            .into_iter()
            .map(|r| WidgetRow {
                document_id: r.id,
                description: r.description,
                created: format_date(&r.created, date_format),
            })
            .collect();

        Self {
            subject_username: subject_username.to_string(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ids of every listed report.
    pub fn document_ids(&self) -> Vec<DocumentId> {
        self.rows.iter().map(|r| r.document_id).collect()
    }

    /// The id list for a "download all" request.
    pub fn bundle_request(&self) -> String {
        self.rows
            .iter()
            .map(|r| r.document_id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn format_date(created: &chrono::NaiveDateTime, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", created.format(pattern)).is_err() {
        // Unvalidated pattern; fall back to ISO date.
        return created.date().to_string();
    }
    out
}

//! `requel generate` report (report.json)
//!
//! Bump `REPORT_VERSION` whenever a field changes meaning or disappears.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::diagnostic::{Diagnostic, Severity};

/// Current report format
pub const REPORT_VERSION: u32 = 1;

/// Counters over one generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,

    /// SQL files picked up by discovery
    pub files_analyzed: usize,

    /// Files whose `.d.ts` was written
    pub declarations_written: usize,
}

/// Diagnostics of a whole run, tagged with its format version and start time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub version: u32,

    /// RFC 3339, UTC
    pub generated_at: String,

    pub summary: ReportSummary,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            version: REPORT_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            summary: ReportSummary::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        let counter = match diagnostic.severity {
            Severity::Error => &mut self.summary.errors,
            Severity::Warn => &mut self.summary.warnings,
            Severity::Info => &mut self.summary.info,
        };
        *counter += 1;
        self.diagnostics.push(diagnostic);
    }

    /// Count one analyzed file
    pub fn record_file(&mut self, declaration_written: bool) {
        self.summary.files_analyzed += 1;
        if declaration_written {
            self.summary.declarations_written += 1;
        }
    }

    /// Write as pretty-printed JSON
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

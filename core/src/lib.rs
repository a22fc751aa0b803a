pub mod core;
pub mod http;
pub mod modules;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use crate::core::aggregator::{AggregateStats, Aggregation, DimensionBuckets, IssueAggregator};
pub use crate::core::category::{CategoryRules, Dimension};
pub use crate::core::engine::{AuditEngine, PageSnapshot, ScanContext, Scanner, ScannerOutput};
pub use crate::core::identity::{fallback_identity, issue_identity};
pub use crate::core::issue::{normalize_issue, normalize_severity, Fix, Issue, RawIssue, Severity};
pub use crate::core::remediation::{attach_fixes, fix_for};
pub use crate::core::report::{
    DimensionReport, RawPayload, Report, ReportAssembler, ReportStatus, Summary,
};
pub use crate::core::score::{DimensionScores, ScorePolicy, DISABLED_DIMENSION_SCORE, FALLBACK_SCORE};
pub use crate::core::store::ReportStore;
pub use crate::http::HttpClient;
pub use crate::utils::read_lines;

/// Shared audit configuration used by the CLI and any embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditConfig {
    pub target: String,
    pub list_file: String,
    pub timeout: u64,
    pub output: String,
    pub proxy: String,
    pub headers: String,
    pub verbose: bool,
    pub dry_run: bool,
    pub retention_days: i64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            list_file: String::new(),
            timeout: 10,
            output: "audit_report.json".to_string(),
            proxy: String::new(),
            headers: String::new(),
            verbose: false,
            dry_run: false,
            retention_days: 30,
        }
    }
}

impl AuditConfig {
    pub fn header_list(&self) -> Vec<String> {
        if self.headers.is_empty() {
            Vec::new()
        } else {
            self.headers
                .split(';')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }
    }

    pub fn parsed_headers(&self) -> Vec<(String, String)> {
        parse_custom_headers(&self.header_list())
    }

    pub fn proxy_ref(&self) -> Option<&str> {
        if self.proxy.is_empty() { None } else { Some(&self.proxy) }
    }
}

pub fn parse_custom_headers(raw: &[String]) -> Vec<(String, String)> {
    raw.iter().filter_map(|h| {
        let mut parts = h.splitn(2, ':');
        let key = parts.next()?.trim().to_string();
        let val = parts.next().unwrap_or("").trim().to_string();
        if key.is_empty() { return None; }
        Some((key, val))
    }).collect()
}

/// Output abstraction for the audit pipeline.
/// The CLI implements this with colored terminal output; an API embedder
/// would forward events to its own channel.
pub trait AuditEventSink: Send + Sync {
    fn on_log(&self, level: &str, message: &str);
    fn on_finding(&self, issue: &Issue, dimension: Dimension);
    fn on_progress(&self, phase: &str, current: usize, total: usize);
}

pub type SinkRef = Arc<dyn AuditEventSink>;

/// Terminal output sink for CLI usage.
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new_ref() -> SinkRef {
        Arc::new(Self)
    }
}

impl AuditEventSink for ConsoleSink {
    fn on_log(&self, level: &str, message: &str) {
        use colored::*;
        use std::io::Write;
        let colored = match level {
            "success" => message.green().to_string(),
            "error"   => message.red().to_string(),
            "warn"    => message.yellow().to_string(),
            "phase"   => message.bright_cyan().bold().to_string(),
            _         => message.to_string(),
        };
        print!("{}\r\n", colored);
        std::io::stdout().flush().ok();
    }

    fn on_finding(&self, issue: &Issue, dimension: Dimension) {
        use colored::*;
        use std::io::Write;
        let out = |text: &str| {
            print!("{}\r\n", text);
            std::io::stdout().flush().ok();
        };
        let severity = match issue.severity {
            Severity::Critical => issue.severity.to_string().red().bold().to_string(),
            Severity::Medium => issue.severity.to_string().yellow().to_string(),
            Severity::Low => issue.severity.to_string().blue().to_string(),
        };
        out(&format!(
            "{} [{}] {} ({})",
            "[+]".green().bold(),
            severity,
            issue.issue_type.white().bold(),
            dimension.to_string().bright_cyan()
        ));
        out(&format!("    {}", issue.description.dimmed()));
        if let Some(ref location) = issue.location {
            out(&format!("    at {}", location.dimmed()));
        }
    }

    fn on_progress(&self, phase: &str, current: usize, total: usize) {
        use colored::*;
        use std::io::Write;
        if total > 0 {
            print!("{}\r\n", format!("[*] {} ({}/{})", phase, current, total).bright_cyan());
        } else {
            print!("{}\r\n", format!("[*] {}", phase).bright_cyan());
        }
        std::io::stdout().flush().ok();
    }
}

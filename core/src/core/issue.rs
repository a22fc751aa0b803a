use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed severity set. Foreign values are folded into it by
/// [`normalize_severity`]; nothing outside this enum survives normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Structured remediation advice attached to an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fix {
    pub title: String,
    pub description: String,
    pub code: String,
}

/// A finding as produced by a scanner or read back from storage.
/// Every field is optional; the normalizer decides what survives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIssue {
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub fix: Option<Fix>,
}

impl RawIssue {
    pub fn new(issue_type: &str, severity: Severity, description: &str) -> Self {
        Self {
            issue_type: Some(issue_type.to_string()),
            severity: Some(severity.to_string()),
            description: Some(description.to_string()),
            location: None,
            fix: None,
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    /// Lenient extraction from arbitrary JSON. Non-string fields are treated
    /// as absent rather than failing the whole record, so a corrupted legacy
    /// issue degrades field-by-field instead of poisoning its payload.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(|s| s.to_string())
        };
        Self {
            issue_type: text("type"),
            severity: text("severity"),
            description: text("description"),
            location: text("location"),
            fix: value
                .get("fix")
                .and_then(|f| serde_json::from_value(f.clone()).ok()),
        }
    }
}

/// A finding after normalization: non-empty type, severity in the closed
/// set, guaranteed description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: Severity,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fix: Option<Fix>,
}

/// Maps foreign severity spellings onto the closed set. Unknown or missing
/// values default to `Medium` rather than erroring.
pub fn normalize_severity(raw: Option<&str>) -> Severity {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("critical") | Some("high") | Some("severe") => Severity::Critical,
        Some("medium") | Some("moderate") | Some("warning") => Severity::Medium,
        Some("low") | Some("minor") | Some("info") | Some("informational") => Severity::Low,
        _ => Severity::Medium,
    }
}

/// Validates and coerces a raw finding into the canonical shape.
/// Returns `None` when `type` is missing or blank; the caller counts and
/// logs the drop, it is never a hard failure.
pub fn normalize_issue(raw: &RawIssue) -> Option<Issue> {
    let issue_type = match raw.issue_type.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => {
            debug!("dropping issue with missing or empty type: {:?}", raw);
            return None;
        }
    };

    let description = match raw.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => format!("Detected issue: {}", issue_type),
    };

    Some(Issue {
        severity: normalize_severity(raw.severity.as_deref()),
        description,
        location: raw.location.clone().filter(|l| !l.trim().is_empty()),
        fix: raw.fix.clone(),
        issue_type,
    })
}

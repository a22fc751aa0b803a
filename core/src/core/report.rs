use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::aggregator::{DimensionBuckets, IssueAggregator};
use crate::core::category::Dimension;
use crate::core::issue::{Issue, RawIssue, Severity};
use crate::core::score::{DimensionScores, ScorePolicy, FALLBACK_SCORE};

/// Report lifecycle state. Transitions are driven by external callers
/// (scan endpoint, payment webhook); the pipeline passes it through
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Preliminary,
    AwaitingPayment,
    Completed,
    #[serde(other)]
    Unknown,
}

/// One scored report dimension. `issues` is authoritative; the counts are
/// always recomputed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DimensionReport {
    pub score: u8,
    pub total: usize,
    pub critical: usize,
    pub medium: usize,
    pub low: usize,
    pub issues: Vec<Issue>,
}

impl Default for DimensionReport {
    fn default() -> Self {
        Self {
            score: 100,
            total: 0,
            critical: 0,
            medium: 0,
            low: 0,
            issues: Vec::new(),
        }
    }
}

impl DimensionReport {
    fn from_issues(issues: Vec<Issue>, score: u8) -> Self {
        let critical = issues.iter().filter(|i| i.severity == Severity::Critical).count();
        let medium = issues.iter().filter(|i| i.severity == Severity::Medium).count();
        let low = issues.iter().filter(|i| i.severity == Severity::Low).count();
        Self {
            score,
            total: issues.len(),
            critical,
            medium,
            low,
            issues,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Summary {
    pub overall_score: u8,
    pub total: usize,
    pub critical: usize,
    pub medium: usize,
    pub low: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The assembled report consumed by the API surface, storage, and the
/// PDF/display renderers. Always structurally complete: every dimension
/// carries score/counts/issues even when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    pub id: String,
    pub public_id: String,
    pub url: String,
    pub status: ReportStatus,
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub security: DimensionReport,
    pub seo: DimensionReport,
    pub performance: DimensionReport,
    pub compliance: DimensionReport,
    pub summary: Summary,
    /// Flat legacy view: the four dimension lists concatenated in fixed
    /// dimension order.
    pub issues: Vec<Issue>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            id: String::new(),
            public_id: String::new(),
            url: String::new(),
            status: ReportStatus::Preliminary,
            created_at: Utc::now(),
            expires_at: None,
            security: DimensionReport::default(),
            seo: DimensionReport::default(),
            performance: DimensionReport::default(),
            compliance: DimensionReport::default(),
            summary: Summary::default(),
            issues: Vec::new(),
        }
    }
}

impl Report {
    pub fn dimension(&self, dimension: Dimension) -> &DimensionReport {
        match dimension {
            Dimension::Security => &self.security,
            Dimension::Seo => &self.seo,
            Dimension::Performance => &self.performance,
            Dimension::Compliance => &self.compliance,
        }
    }

    pub fn dimension_mut(&mut self, dimension: Dimension) -> &mut DimensionReport {
        match dimension {
            Dimension::Security => &mut self.security,
            Dimension::Seo => &mut self.seo,
            Dimension::Performance => &mut self.performance,
            Dimension::Compliance => &mut self.compliance,
        }
    }
}

/// Loose raw dimension shape as found in stored or legacy payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDimension {
    pub issues: Vec<RawIssue>,
}

/// Input to the assembler: fresh scanner output, a stored report, or a
/// legacy record of uncertain shape. Everything is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPayload {
    pub id: Option<String>,
    pub public_id: Option<String>,
    pub url: Option<String>,
    pub status: Option<ReportStatus>,
    #[serde(alias = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub issues: Vec<RawIssue>,
    pub security: Option<RawDimension>,
    pub seo: Option<RawDimension>,
    pub performance: Option<RawDimension>,
    pub compliance: Option<RawDimension>,
}

impl RawPayload {
    /// The single issue source for aggregation: the flat list when present,
    /// otherwise the concatenated per-dimension lists. Feeding a stored
    /// report back through therefore reprocesses the same issues instead
    /// of double-counting them.
    pub fn flattened_issues(&self) -> Vec<RawIssue> {
        if !self.issues.is_empty() {
            return self.issues.clone();
        }
        [&self.security, &self.seo, &self.performance, &self.compliance]
            .into_iter()
            .flatten()
            .flat_map(|d| d.issues.iter().cloned())
            .collect()
    }
}

impl From<&Report> for RawPayload {
    fn from(report: &Report) -> Self {
        let to_raw = |issues: &[Issue]| {
            issues
                .iter()
                .map(|i| RawIssue {
                    issue_type: Some(i.issue_type.clone()),
                    severity: Some(i.severity.to_string()),
                    description: Some(i.description.clone()),
                    location: i.location.clone(),
                    fix: i.fix.clone(),
                })
                .collect::<Vec<_>>()
        };
        Self {
            id: Some(report.id.clone()),
            public_id: Some(report.public_id.clone()),
            url: Some(report.url.clone()),
            status: Some(report.status),
            created_at: Some(report.created_at),
            expires_at: report.expires_at,
            issues: to_raw(&report.issues),
            security: Some(RawDimension { issues: to_raw(&report.security.issues) }),
            seo: Some(RawDimension { issues: to_raw(&report.seo.issues) }),
            performance: Some(RawDimension { issues: to_raw(&report.performance.issues) }),
            compliance: Some(RawDimension { issues: to_raw(&report.compliance.issues) }),
        }
    }
}

/// Turns a raw payload into a fully populated, scored report. Stateless;
/// every call works on its own copy of the input, so concurrent report
/// processing needs no locking.
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    aggregator: IssueAggregator,
    policy: ScorePolicy,
}

impl ReportAssembler {
    pub fn new(aggregator: IssueAggregator, policy: ScorePolicy) -> Self {
        Self { aggregator, policy }
    }

    /// Assembles a report. Never fails: an unusable payload yields the
    /// safe-fallback shape with `summary.error` set instead of an error,
    /// so API handlers always have something coherent to render.
    pub fn assemble(&self, payload: &RawPayload) -> Report {
        let mut report = self.base_report(payload);

        let raw_issues = payload.flattened_issues();
        if raw_issues.is_empty() {
            // Structurally complete zero-issue report; dimension defaults
            // already carry score 100 and empty counts.
            report.summary.overall_score = self.policy.overall_score(
                &self.collect_scores(&report),
                false,
            );
            return report;
        }

        let aggregation = self.aggregator.aggregate(&raw_issues);
        self.apply_buckets(&mut report, aggregation.buckets);
        report
    }

    /// Assembles from arbitrary JSON (legacy storage records). A record
    /// that cannot even be read leniently produces the safe-fallback
    /// report rather than an error.
    pub fn assemble_value(&self, value: &Value) -> Report {
        match serde_json::from_value::<RawPayload>(value.clone()) {
            Ok(payload) => self.assemble(&payload),
            Err(e) => {
                warn!("unreadable report payload, returning fallback: {}", e);
                self.fallback_report(value, &e.to_string())
            }
        }
    }

    /// Reprocesses an existing report. Idempotent: the output carries the
    /// same dimension contents and scores as the input when the input was
    /// itself assembled by this pipeline.
    pub fn reassemble(&self, report: &Report) -> Report {
        self.assemble(&RawPayload::from(report))
    }

    fn base_report(&self, payload: &RawPayload) -> Report {
        Report {
            id: payload
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            public_id: payload
                .public_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
            url: payload.url.clone().unwrap_or_default(),
            status: payload.status.unwrap_or_default(),
            created_at: payload.created_at.unwrap_or_else(Utc::now),
            expires_at: payload.expires_at,
            ..Default::default()
        }
    }

    fn apply_buckets(&self, report: &mut Report, buckets: DimensionBuckets) {
        report.issues = buckets.flatten();

        for dimension in Dimension::ALL {
            let issues = buckets.get(dimension).clone();
            let score = self.policy.dimension_score(&issues, dimension);
            *report.dimension_mut(dimension) = DimensionReport::from_issues(issues, score);
        }

        let compliance_has_issues = !report.compliance.issues.is_empty();
        let scores = self.collect_scores(report);

        let mut summary = Summary {
            overall_score: self.policy.overall_score(&scores, compliance_has_issues),
            total: Dimension::ALL.iter().map(|d| report.dimension(*d).total).sum(),
            critical: Dimension::ALL.iter().map(|d| report.dimension(*d).critical).sum(),
            medium: Dimension::ALL.iter().map(|d| report.dimension(*d).medium).sum(),
            low: Dimension::ALL.iter().map(|d| report.dimension(*d).low).sum(),
            error: None,
        };

        // The issues lists are authoritative. A drifted total is replaced,
        // never propagated.
        let recomputed = summary.critical + summary.medium + summary.low;
        if summary.total != recomputed {
            warn!("summary total {} != severity sum {}, replacing", summary.total, recomputed);
            summary.total = recomputed;
        }

        report.summary = summary;
    }

    fn collect_scores(&self, report: &Report) -> DimensionScores {
        DimensionScores {
            security: report.security.score,
            seo: report.seo.score,
            performance: report.performance.score,
            compliance: report.compliance.score,
        }
    }

    /// The documented safe-fallback shape: zeroed dimensions at their
    /// default scores, conservative overall score, explicit error marker.
    fn fallback_report(&self, value: &Value, error: &str) -> Report {
        let url = value
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Report {
            url,
            summary: Summary {
                overall_score: FALLBACK_SCORE,
                error: Some(error.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(issue_type: &str, severity: &str, description: &str) -> RawIssue {
        RawIssue {
            issue_type: Some(issue_type.to_string()),
            severity: Some(severity.to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    fn assembler() -> ReportAssembler {
        ReportAssembler::default()
    }

    #[test]
    fn test_zero_issue_payload_yields_complete_report() {
        let report = assembler().assemble(&RawPayload {
            url: Some("https://example.com".to_string()),
            ..Default::default()
        });

        for dimension in Dimension::ALL {
            let d = report.dimension(dimension);
            assert_eq!(d.total, 0);
            assert_eq!(d.score, 100);
            assert!(d.issues.is_empty());
        }
        assert_eq!(report.summary.overall_score, 100);
        assert_eq!(report.summary.total, 0);
        assert!(report.summary.error.is_none());
        assert!(!report.id.is_empty());
        assert!(!report.public_id.is_empty());
    }

    #[test]
    fn test_mixed_payload_buckets_and_counts() {
        let payload = RawPayload {
            url: Some("https://example.com".to_string()),
            issues: vec![
                raw("missing-schema-markup", "critical", "No JSON-LD found"),
                raw("weak-ssl-cipher", "medium", "Outdated cipher suite"),
            ],
            ..Default::default()
        };
        let report = assembler().assemble(&payload);

        assert_eq!(report.seo.total, 1);
        assert_eq!(report.seo.critical, 1);
        assert_eq!(report.security.total, 1);
        assert_eq!(report.security.medium, 1);
        assert_eq!(report.summary.total, 2);
        assert_eq!(
            report.summary.total,
            report.summary.critical + report.summary.medium + report.summary.low
        );
    }

    #[test]
    fn test_dimension_counts_always_sum_to_total() {
        let payload = RawPayload {
            issues: vec![
                raw("missing-alt-text", "low", "Image missing alt"),
                raw("missing-title-tag", "medium", "No title"),
                raw("exposed-sensitive-file", "critical", ".env reachable"),
            ],
            ..Default::default()
        };
        let report = assembler().assemble(&payload);

        for dimension in Dimension::ALL {
            let d = report.dimension(dimension);
            assert_eq!(d.critical + d.medium + d.low, d.total);
            assert_eq!(d.issues.len(), d.total);
        }
    }

    #[test]
    fn test_flat_issues_equal_concatenated_dimensions() {
        let payload = RawPayload {
            issues: vec![
                raw("missing-schema-markup", "critical", "No JSON-LD found"),
                raw("weak-ssl-cipher", "medium", "Outdated cipher suite"),
                raw("missing-cookie-consent", "medium", "No consent banner"),
            ],
            ..Default::default()
        };
        let report = assembler().assemble(&payload);

        let concatenated: Vec<Issue> = Dimension::ALL
            .iter()
            .flat_map(|d| report.dimension(*d).issues.iter().cloned())
            .collect();
        assert_eq!(report.issues, concatenated);
    }

    #[test]
    fn test_reassembly_is_idempotent() {
        let payload = RawPayload {
            url: Some("https://example.com".to_string()),
            issues: vec![
                raw("missing-schema-markup", "critical", "No JSON-LD found"),
                raw("weak-ssl-cipher", "medium", "Outdated cipher suite"),
                raw("missing-cookie-consent", "medium", "No consent banner"),
                raw("missing-response-compression", "low", "No gzip"),
            ],
            ..Default::default()
        };
        let a = assembler().assemble(&payload);
        let b = assembler().reassemble(&a);

        assert_eq!(a.security, b.security);
        assert_eq!(a.seo, b.seo);
        assert_eq!(a.performance, b.performance);
        assert_eq!(a.compliance, b.compliance);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.issues, b.issues);
        assert_eq!(a.status, b.status);
    }

    #[test]
    fn test_stored_report_with_only_dimension_lists_reprocesses() {
        // Legacy records sometimes carry dimension issues without the flat
        // list; both sources must aggregate identically.
        let payload = RawPayload {
            security: Some(RawDimension {
                issues: vec![raw("weak-ssl-cipher", "medium", "Outdated cipher suite")],
            }),
            seo: Some(RawDimension {
                issues: vec![raw("missing-schema-markup", "critical", "No JSON-LD found")],
            }),
            ..Default::default()
        };
        let report = assembler().assemble(&payload);

        assert_eq!(report.security.total, 1);
        assert_eq!(report.seo.total, 1);
        assert_eq!(report.summary.total, 2);
    }

    #[test]
    fn test_status_and_metadata_pass_through() {
        let created = Utc::now();
        let payload = RawPayload {
            id: Some("rep_1".to_string()),
            public_id: Some("pub_abc".to_string()),
            url: Some("https://example.com".to_string()),
            status: Some(ReportStatus::AwaitingPayment),
            created_at: Some(created),
            ..Default::default()
        };
        let report = assembler().assemble(&payload);

        assert_eq!(report.id, "rep_1");
        assert_eq!(report.public_id, "pub_abc");
        assert_eq!(report.status, ReportStatus::AwaitingPayment);
        assert_eq!(report.created_at, created);
    }

    #[test]
    fn test_unreadable_value_yields_safe_fallback() {
        let report = assembler().assemble_value(&json!({
            "url": "https://example.com",
            "issues": "definitely not an array",
        }));

        assert_eq!(report.url, "https://example.com");
        assert!(report.summary.error.is_some());
        assert_eq!(report.summary.overall_score, FALLBACK_SCORE);
        for dimension in Dimension::ALL {
            assert_eq!(report.dimension(dimension).total, 0);
        }
    }

    #[test]
    fn test_malformed_issue_inside_payload_does_not_abort() {
        let value = json!({
            "url": "https://example.com",
            "issues": [
                {"severity": "critical", "description": "no type here"},
                {"type": "weak-ssl-cipher", "severity": "medium", "description": "Outdated cipher suite"},
            ],
        });
        let report = assembler().assemble_value(&value);

        assert!(report.summary.error.is_none());
        // The typeless finding is dropped, the valid one survives.
        assert_eq!(report.security.total, 1);
        assert_eq!(report.summary.total, 1);
        for dimension in [Dimension::Seo, Dimension::Performance, Dimension::Compliance] {
            assert_eq!(report.dimension(dimension).total, 0);
        }
    }

    #[test]
    fn test_report_serializes_with_camel_case_contract() {
        let report = assembler().assemble(&RawPayload {
            url: Some("https://example.com".to_string()),
            ..Default::default()
        });
        let value = serde_json::to_value(&report).unwrap();

        assert!(value.get("publicId").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("summary").and_then(|s| s.get("overallScore")).is_some());
        for key in ["security", "seo", "performance", "compliance"] {
            let d = value.get(key).unwrap();
            for field in ["score", "total", "critical", "medium", "low", "issues"] {
                assert!(d.get(field).is_some(), "missing {}.{}", key, field);
            }
        }
    }
}

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::category::Dimension;
use crate::core::issue::{Issue, Severity};

/// Score pinned to a dimension whose policy flag disables it.
pub const DISABLED_DIMENSION_SCORE: u8 = 100;

/// Conservative score used when scoring input is unusable (e.g. a weight
/// table that does not sum to 1.0). Scoring never fails the pipeline.
pub const FALLBACK_SCORE: u8 = 70;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Point deductions per finding, by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityPenalties {
    pub critical: u32,
    pub medium: u32,
    pub low: u32,
}

/// Per-dimension scoring behavior. A dimension outside the current product
/// focus can be disabled, which pins its score regardless of issue count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionPolicy {
    pub enabled: bool,
    pub penalties: SeverityPenalties,
}

/// Relative dimension weights for the overall score. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionWeights {
    pub security: f64,
    pub seo: f64,
    pub performance: f64,
    pub compliance: f64,
}

impl DimensionWeights {
    fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Security => self.security,
            Dimension::Seo => self.seo,
            Dimension::Performance => self.performance,
            Dimension::Compliance => self.compliance,
        }
    }

    fn sum(&self) -> f64 {
        self.security + self.seo + self.performance + self.compliance
    }
}

/// Integer scores per dimension, all in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScores {
    pub security: u8,
    pub seo: u8,
    pub performance: u8,
    pub compliance: u8,
}

impl DimensionScores {
    pub fn get(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Security => self.security,
            Dimension::Seo => self.seo,
            Dimension::Performance => self.performance,
            Dimension::Compliance => self.compliance,
        }
    }
}

/// The single canonical scoring table. Historically these constants drifted
/// apart across call sites; they live here and nowhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePolicy {
    pub security: DimensionPolicy,
    pub seo: DimensionPolicy,
    pub performance: DimensionPolicy,
    pub compliance: DimensionPolicy,
    /// Weights when the compliance bucket is empty.
    pub base_weights: DimensionWeights,
    /// Weights when compliance holds at least one finding; compliance is
    /// deliberately weighted up in that case.
    pub compliance_findings_weights: DimensionWeights,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self {
            security: DimensionPolicy {
                enabled: true,
                penalties: SeverityPenalties { critical: 15, medium: 8, low: 3 },
            },
            seo: DimensionPolicy {
                enabled: true,
                penalties: SeverityPenalties { critical: 12, medium: 6, low: 2 },
            },
            performance: DimensionPolicy {
                enabled: true,
                penalties: SeverityPenalties { critical: 10, medium: 5, low: 2 },
            },
            compliance: DimensionPolicy {
                enabled: true,
                penalties: SeverityPenalties { critical: 10, medium: 5, low: 2 },
            },
            base_weights: DimensionWeights {
                security: 0.30,
                seo: 0.40,
                performance: 0.20,
                compliance: 0.10,
            },
            compliance_findings_weights: DimensionWeights {
                security: 0.28,
                seo: 0.36,
                performance: 0.18,
                compliance: 0.18,
            },
        }
    }
}

impl ScorePolicy {
    pub fn dimension(&self, dimension: Dimension) -> &DimensionPolicy {
        match dimension {
            Dimension::Security => &self.security,
            Dimension::Seo => &self.seo,
            Dimension::Performance => &self.performance,
            Dimension::Compliance => &self.compliance,
        }
    }

    /// Scores one dimension from its issue list: start at 100, deduct per
    /// finding by severity, clamp to [0, 100]. Monotone non-increasing in
    /// the issue list.
    pub fn dimension_score(&self, issues: &[Issue], dimension: Dimension) -> u8 {
        let policy = self.dimension(dimension);
        if !policy.enabled {
            return DISABLED_DIMENSION_SCORE;
        }

        let mut deduction: u64 = 0;
        for issue in issues {
            deduction += match issue.severity {
                Severity::Critical => policy.penalties.critical as u64,
                Severity::Medium => policy.penalties.medium as u64,
                Severity::Low => policy.penalties.low as u64,
            };
        }

        100u64.saturating_sub(deduction) as u8
    }

    /// Weighted overall score across the four dimensions, rounded and
    /// clamped. The weight table is selected by whether compliance holds
    /// findings; a misconfigured table (sum != 1.0) yields the documented
    /// fallback instead of a bogus score.
    pub fn overall_score(&self, scores: &DimensionScores, compliance_has_issues: bool) -> u8 {
        let weights = if compliance_has_issues {
            &self.compliance_findings_weights
        } else {
            &self.base_weights
        };

        if (weights.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            warn!("dimension weights sum to {}, using fallback score", weights.sum());
            return FALLBACK_SCORE;
        }

        let weighted: f64 = Dimension::ALL
            .iter()
            .map(|d| scores.get(*d) as f64 * weights.get(*d))
            .sum();

        weighted.round().clamp(0.0, 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: Severity) -> Issue {
        Issue {
            issue_type: "weak-ssl-cipher".to_string(),
            severity,
            description: "test".to_string(),
            location: None,
            fix: None,
        }
    }

    #[test]
    fn test_zero_issues_scores_100() {
        let policy = ScorePolicy::default();
        for dimension in Dimension::ALL {
            assert_eq!(policy.dimension_score(&[], dimension), 100);
        }
    }

    #[test]
    fn test_critical_issue_lowers_score() {
        let policy = ScorePolicy::default();
        let score = policy.dimension_score(&[issue(Severity::Critical)], Dimension::Security);
        assert!(score < 100);
        assert_eq!(score, 85);
    }

    #[test]
    fn test_adding_an_issue_never_raises_score() {
        let policy = ScorePolicy::default();
        let mut issues = Vec::new();
        let mut previous = policy.dimension_score(&issues, Dimension::Seo);
        for severity in [Severity::Low, Severity::Medium, Severity::Critical, Severity::Low] {
            issues.push(issue(severity));
            let next = policy.dimension_score(&issues, Dimension::Seo);
            assert!(next <= previous);
            previous = next;
        }
    }

    #[test]
    fn test_score_is_clamped_at_zero() {
        let policy = ScorePolicy::default();
        let issues: Vec<Issue> = (0..50).map(|_| issue(Severity::Critical)).collect();
        assert_eq!(policy.dimension_score(&issues, Dimension::Security), 0);
    }

    #[test]
    fn test_disabled_dimension_is_pinned() {
        let mut policy = ScorePolicy::default();
        policy.performance.enabled = false;
        let issues: Vec<Issue> = (0..10).map(|_| issue(Severity::Critical)).collect();
        assert_eq!(
            policy.dimension_score(&issues, Dimension::Performance),
            DISABLED_DIMENSION_SCORE
        );
    }

    #[test]
    fn test_overall_score_of_perfect_dimensions_is_100() {
        let policy = ScorePolicy::default();
        let scores = DimensionScores { security: 100, seo: 100, performance: 100, compliance: 100 };
        assert_eq!(policy.overall_score(&scores, false), 100);
        assert_eq!(policy.overall_score(&scores, true), 100);
    }

    #[test]
    fn test_overall_score_is_weighted() {
        let policy = ScorePolicy::default();
        let scores = DimensionScores { security: 0, seo: 100, performance: 100, compliance: 100 };
        // 0.30 weight on a zero security score: 70 overall.
        assert_eq!(policy.overall_score(&scores, false), 70);
    }

    #[test]
    fn test_compliance_reweighting_is_deterministic() {
        let policy = ScorePolicy::default();
        let scores = DimensionScores { security: 80, seo: 90, performance: 70, compliance: 40 };
        let without = policy.overall_score(&scores, false);
        let with = policy.overall_score(&scores, true);
        // A poor compliance score drags the overall down harder once
        // compliance has findings.
        assert!(with < without);
        assert_eq!(policy.overall_score(&scores, true), with);
    }

    #[test]
    fn test_bad_weight_table_yields_fallback() {
        let mut policy = ScorePolicy::default();
        policy.base_weights.seo = 0.9;
        let scores = DimensionScores { security: 100, seo: 100, performance: 100, compliance: 100 };
        assert_eq!(policy.overall_score(&scores, false), FALLBACK_SCORE);
    }

    #[test]
    fn test_both_weight_tables_sum_to_one() {
        let policy = ScorePolicy::default();
        assert!((policy.base_weights.sum() - 1.0).abs() < 1e-9);
        assert!((policy.compliance_findings_weights.sum() - 1.0).abs() < 1e-9);
    }
}

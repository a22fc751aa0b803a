use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::category::{CategoryRules, Dimension};
use crate::core::identity::issue_identity;
use crate::core::issue::{normalize_issue, Issue, RawIssue};

/// Issues bucketed by dimension, each issue in exactly one bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionBuckets {
    pub security: Vec<Issue>,
    pub seo: Vec<Issue>,
    pub performance: Vec<Issue>,
    pub compliance: Vec<Issue>,
}

impl DimensionBuckets {
    pub fn get(&self, dimension: Dimension) -> &Vec<Issue> {
        match dimension {
            Dimension::Security => &self.security,
            Dimension::Seo => &self.seo,
            Dimension::Performance => &self.performance,
            Dimension::Compliance => &self.compliance,
        }
    }

    pub fn get_mut(&mut self, dimension: Dimension) -> &mut Vec<Issue> {
        match dimension {
            Dimension::Security => &mut self.security,
            Dimension::Seo => &mut self.seo,
            Dimension::Performance => &mut self.performance,
            Dimension::Compliance => &mut self.compliance,
        }
    }

    pub fn total(&self) -> usize {
        Dimension::ALL.iter().map(|d| self.get(*d).len()).sum()
    }

    /// Concatenation of all buckets in fixed dimension order. This is the
    /// flat legacy view carried on the report.
    pub fn flatten(&self) -> Vec<Issue> {
        Dimension::ALL
            .iter()
            .flat_map(|d| self.get(*d).iter().cloned())
            .collect()
    }
}

/// Bookkeeping for one aggregation run.
/// Invariant: `surviving + skipped + duplicates == input`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub input: usize,
    pub surviving: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub buckets: DimensionBuckets,
    pub stats: AggregateStats,
}

/// Merges heterogeneous scanner findings: normalize, deduplicate by derived
/// identity (first occurrence wins, input order preserved), and bucket each
/// survivor into exactly one dimension.
///
/// Re-entrant by construction: feeding a report's flattened issue list back
/// through yields the same buckets, since normalization and categorization
/// are idempotent and identities are stable.
#[derive(Debug, Clone, Default)]
pub struct IssueAggregator {
    rules: CategoryRules,
}

impl IssueAggregator {
    pub fn new(rules: CategoryRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &CategoryRules {
        &self.rules
    }

    pub fn aggregate(&self, raw_issues: &[RawIssue]) -> Aggregation {
        let mut buckets = DimensionBuckets::default();
        let mut stats = AggregateStats::default();
        let mut seen: HashSet<String> = HashSet::new();

        for raw in raw_issues {
            stats.input += 1;

            // Typeless findings have no stable identity and are dropped;
            // findings with an unrecognized type are still kept, landing in
            // the default dimension via the categorizer fallback.
            let issue = match normalize_issue(raw) {
                Some(issue) => issue,
                None => {
                    warn!("skipping malformed issue with no usable type");
                    stats.skipped += 1;
                    continue;
                }
            };

            if !seen.insert(issue_identity(&issue)) {
                stats.duplicates += 1;
                continue;
            }

            let dimension = self.rules.categorize(&issue.issue_type);
            debug!("categorized {} into {}", issue.issue_type, dimension);
            buckets.get_mut(dimension).push(issue);
            stats.surviving += 1;
        }

        Aggregation { buckets, stats }
    }
}

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use log::warn;
use tokio::time::{sleep, Duration};
use url::Url;
use uuid::Uuid;

use crate::core::category::Dimension;
use crate::core::issue::RawIssue;
use crate::core::remediation;
use crate::core::report::{RawPayload, Report, ReportAssembler, ReportStatus};
use crate::http::HttpClient;
use crate::SinkRef;

const SCANNER_RETRIES: u32 = 2;
const RETRY_BASE_DELAY_MS: u64 = 250;

/// One fetch of the target page, shared read-only by every scanner so the
/// battery hits the site once instead of N times.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub requested_url: String,
    pub final_url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub fetch_ms: u128,
}

impl PageSnapshot {
    /// Case-insensitive header lookup; first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Everything a scanner may consult: the parsed target, the shared page
/// snapshot, and the HTTP client for scanners that probe additional paths.
pub struct ScanContext {
    pub target: Url,
    pub snapshot: PageSnapshot,
    pub client: Arc<HttpClient>,
}

#[derive(Debug, Default)]
pub struct ScannerOutput {
    pub issues: Vec<RawIssue>,
}

/// A single independent check. Scanners are black boxes to the pipeline:
/// all that matters downstream is the issue list they return.
#[async_trait]
pub trait Scanner: Send + Sync {
    fn name(&self) -> &'static str;
    async fn scan(&self, ctx: &ScanContext) -> Result<ScannerOutput>;
}

/// Orchestrates one audit: fetch the target, fan the scanner battery out
/// concurrently, aggregate the findings into a scored report.
pub struct AuditEngine {
    client: Arc<HttpClient>,
    scanners: Vec<Arc<dyn Scanner>>,
    assembler: ReportAssembler,
    retention_days: i64,
}

impl AuditEngine {
    pub fn new(client: Arc<HttpClient>, assembler: ReportAssembler, retention_days: i64) -> Self {
        Self {
            client,
            scanners: Vec::new(),
            assembler,
            retention_days,
        }
    }

    /// Engine preloaded with the built-in scanner battery.
    pub fn with_default_scanners(
        client: Arc<HttpClient>,
        assembler: ReportAssembler,
        retention_days: i64,
    ) -> Self {
        let mut engine = Self::new(client, assembler, retention_days);
        for scanner in crate::modules::default_scanners() {
            engine.register(scanner);
        }
        engine
    }

    pub fn register(&mut self, scanner: Arc<dyn Scanner>) {
        self.scanners.push(scanner);
    }

    pub fn scanner_count(&self) -> usize {
        self.scanners.len()
    }

    /// Runs the full audit for one target. Scanner failures are isolated:
    /// a scanner that errors through all its retries contributes zero
    /// issues and never fails the audit.
    pub async fn audit(&self, target: &str, sink: &SinkRef) -> Result<Report> {
        let url = Url::parse(target).with_context(|| format!("invalid target URL: {}", target))?;

        sink.on_log("phase", &format!("[*] Fetching {}", target));
        let snapshot = self.fetch_snapshot(&url).await?;
        sink.on_log(
            "info",
            &format!("[*] Got {} ({} bytes, {}ms)", snapshot.status, snapshot.body.len(), snapshot.fetch_ms),
        );

        let ctx = Arc::new(ScanContext {
            target: url.clone(),
            snapshot,
            client: Arc::clone(&self.client),
        });

        let total = self.scanners.len();
        let futures = self.scanners.iter().enumerate().map(|(index, scanner)| {
            let scanner = Arc::clone(scanner);
            let ctx = Arc::clone(&ctx);
            let sink = Arc::clone(sink);
            async move {
                let issues = run_scanner_with_retry(scanner.as_ref(), &ctx).await;
                sink.on_progress(scanner.name(), index + 1, total);
                issues
            }
        });

        let raw_issues: Vec<RawIssue> = join_all(futures).await.into_iter().flatten().collect();

        let now = Utc::now();
        let payload = RawPayload {
            id: Some(Uuid::new_v4().to_string()),
            public_id: Some(Uuid::new_v4().simple().to_string()),
            url: Some(url.to_string()),
            status: Some(ReportStatus::Preliminary),
            created_at: Some(now),
            expires_at: Some(now + ChronoDuration::days(self.retention_days)),
            issues: raw_issues,
            ..Default::default()
        };

        let mut report = self.assembler.assemble(&payload);
        remediation::attach_fixes(&mut report);

        for dimension in Dimension::ALL {
            for issue in &report.dimension(dimension).issues {
                sink.on_finding(issue, dimension);
            }
        }

        Ok(report)
    }

    /// Reprocesses a stored report through the same pipeline (display
    /// refresh, debugging, and PDF generation all share this path).
    pub fn reprocess(&self, report: &Report) -> Report {
        let mut reassembled = self.assembler.reassemble(report);
        remediation::attach_fixes(&mut reassembled);
        reassembled
    }

    async fn fetch_snapshot(&self, url: &Url) -> Result<PageSnapshot> {
        let start = Instant::now();
        let response = self
            .client
            .get(url.as_str())
            .await
            .with_context(|| format!("failed to fetch {}", url))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response.text().await.unwrap_or_default();

        Ok(PageSnapshot {
            requested_url: url.to_string(),
            final_url,
            status,
            headers,
            body,
            fetch_ms: start.elapsed().as_millis(),
        })
    }
}

/// Bounded retry with exponential backoff (250ms, then 500ms between
/// attempts). Exhausted retries degrade to an empty issue list.
async fn run_scanner_with_retry(scanner: &dyn Scanner, ctx: &ScanContext) -> Vec<RawIssue> {
    for attempt in 0..=SCANNER_RETRIES {
        match scanner.scan(ctx).await {
            Ok(output) => return output.issues,
            Err(e) => {
                warn!("scanner {} attempt {} failed: {}", scanner.name(), attempt + 1, e);
                if attempt < SCANNER_RETRIES {
                    sleep(Duration::from_millis(RETRY_BASE_DELAY_MS << attempt)).await;
                }
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
pub(crate) fn test_context(body: &str, headers: &[(&str, &str)]) -> ScanContext {
    ScanContext {
        target: Url::parse("https://example.com/").unwrap(),
        snapshot: PageSnapshot {
            requested_url: "https://example.com/".to_string(),
            final_url: "https://example.com/".to_string(),
            status: 200,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
            fetch_ms: 10,
        },
        client: Arc::new(HttpClient::new(5, None, &[])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyScanner {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Scanner for FlakyScanner {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn scan(&self, _ctx: &ScanContext) -> Result<ScannerOutput> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                anyhow::bail!("transient failure");
            }
            Ok(ScannerOutput {
                issues: vec![RawIssue::new(
                    "weak-ssl-cipher",
                    crate::core::issue::Severity::Medium,
                    "Outdated cipher suite",
                )],
            })
        }
    }

    #[test]
    fn test_snapshot_header_lookup_is_case_insensitive() {
        let ctx = test_context("", &[("Strict-Transport-Security", "max-age=63072000")]);
        assert!(ctx.snapshot.header("strict-transport-security").is_some());
        assert!(ctx.snapshot.header("STRICT-TRANSPORT-SECURITY").is_some());
        assert!(ctx.snapshot.header("x-missing").is_none());
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let scanner = FlakyScanner {
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        };
        let ctx = test_context("", &[]);
        let issues = run_scanner_with_retry(&scanner, &ctx).await;
        assert_eq!(issues.len(), 1);
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_degrade_to_empty() {
        let scanner = FlakyScanner {
            failures_before_success: 10,
            calls: AtomicU32::new(0),
        };
        let ctx = test_context("", &[]);
        let issues = run_scanner_with_retry(&scanner, &ctx).await;
        assert!(issues.is_empty());
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 3);
    }
}

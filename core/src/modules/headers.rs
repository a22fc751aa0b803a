use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::core::engine::{ScanContext, Scanner, ScannerOutput};
use crate::core::issue::{RawIssue, Severity};

/// Response header checks: missing security headers plus the header-level
/// performance hygiene (compression, caching).
pub struct HeadersScanner;

const COMPRESSIBLE_BODY_THRESHOLD: usize = 10 * 1024;
const LARGE_PAGE_THRESHOLD: usize = 1_500_000;

#[async_trait]
impl Scanner for HeadersScanner {
    fn name(&self) -> &'static str {
        "headers"
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<ScannerOutput> {
        let snapshot = &ctx.snapshot;
        let mut issues = Vec::new();

        if ctx.target.scheme() == "https" && snapshot.header("strict-transport-security").is_none() {
            issues.push(RawIssue::new(
                "missing-hsts-header",
                Severity::Medium,
                "Strict-Transport-Security header is not set; browsers will accept downgraded connections",
            ));
        }

        if snapshot.header("content-security-policy").is_none() {
            issues.push(RawIssue::new(
                "missing-csp-header",
                Severity::Medium,
                "No Content-Security-Policy header; inline scripts and foreign resources are unrestricted",
            ));
        }

        let framing_covered = snapshot
            .header("content-security-policy")
            .map(|csp| csp.to_lowercase().contains("frame-ancestors"))
            .unwrap_or(false);
        if !framing_covered && snapshot.header("x-frame-options").is_none() {
            issues.push(RawIssue::new(
                "missing-x-frame-options-header",
                Severity::Medium,
                "Page can be embedded in foreign frames (clickjacking)",
            ));
        }

        if snapshot.header("x-content-type-options").is_none() {
            issues.push(RawIssue::new(
                "missing-x-content-type-options-header",
                Severity::Low,
                "X-Content-Type-Options is not set; browsers may MIME-sniff responses",
            ));
        }

        if snapshot.header("referrer-policy").is_none() {
            issues.push(RawIssue::new(
                "missing-referrer-policy-header",
                Severity::Low,
                "No Referrer-Policy header; full URLs leak to third parties",
            ));
        }

        if let Some(server) = snapshot.header("server") {
            if discloses_version(server) {
                issues.push(
                    RawIssue::new(
                        "server-version-header-disclosure",
                        Severity::Low,
                        &format!("Server header discloses software version: {}", server),
                    )
                    .with_location("Server header"),
                );
            }
        }

        if let Some(powered_by) = snapshot.header("x-powered-by") {
            issues.push(
                RawIssue::new(
                    "powered-by-header-disclosure",
                    Severity::Low,
                    &format!("X-Powered-By discloses the backend stack: {}", powered_by),
                )
                .with_location("X-Powered-By header"),
            );
        }

        let compressed = snapshot
            .header("content-encoding")
            .map(|e| e.contains("gzip") || e.contains("br") || e.contains("zstd"))
            .unwrap_or(false);
        if !compressed && snapshot.body.len() >= COMPRESSIBLE_BODY_THRESHOLD {
            issues.push(RawIssue::new(
                "missing-response-compression",
                Severity::Medium,
                "Large response served without gzip/brotli compression",
            ));
        }

        if snapshot.header("cache-control").is_none() {
            issues.push(RawIssue::new(
                "missing-cache-policy",
                Severity::Low,
                "No Cache-Control header; repeat visitors re-download everything",
            ));
        }

        if snapshot.body.len() >= LARGE_PAGE_THRESHOLD {
            issues.push(RawIssue::new(
                "large-page-size",
                Severity::Medium,
                &format!("Page weighs {} bytes before subresources", snapshot.body.len()),
            ));
        }

        Ok(ScannerOutput { issues })
    }
}

/// "nginx/1.18.0" discloses a version, "nginx" alone does not.
fn discloses_version(server: &str) -> bool {
    Regex::new(r"\d+\.\d+")
        .map(|re| re.is_match(server))
        .unwrap_or(false)
}

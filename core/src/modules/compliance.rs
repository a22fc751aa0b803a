use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::core::engine::{ScanContext, Scanner, ScannerOutput};
use crate::core::issue::{RawIssue, Severity};

/// Privacy and accessibility compliance signals (GDPR/ePrivacy, WCAG).
pub struct ComplianceScanner;

const CONSENT_SIGNALS: &[&str] = &[
    "cookie consent",
    "cookie-consent",
    "accept cookies",
    "cookies akzeptieren",
    "cookiebot",
    "onetrust",
    "usercentrics",
    "klaro",
];

#[async_trait]
impl Scanner for ComplianceScanner {
    fn name(&self) -> &'static str {
        "compliance"
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<ScannerOutput> {
        let snapshot = &ctx.snapshot;
        let body_lower = snapshot.body.to_lowercase();
        let mut issues = Vec::new();

        let sets_cookies = snapshot.header("set-cookie").is_some();
        let has_consent = CONSENT_SIGNALS.iter().any(|s| body_lower.contains(s));
        if sets_cookies && !has_consent {
            issues.push(RawIssue::new(
                "missing-cookie-consent",
                Severity::Medium,
                "Site sets cookies without any visible consent mechanism",
            ));
        }

        if !has_privacy_link(&snapshot.body) {
            issues.push(RawIssue::new(
                "missing-privacy-policy",
                Severity::Medium,
                "No privacy policy link found on the page",
            ));
        }

        if !has_lang_attribute(&snapshot.body) {
            issues.push(RawIssue::new(
                "missing-lang-attribute",
                Severity::Low,
                "Document language is not declared on <html> (WCAG 3.1.1)",
            ));
        }

        Ok(ScannerOutput { issues })
    }
}

fn has_privacy_link(body: &str) -> bool {
    Regex::new(r#"(?i)href=["'][^"']*(privacy|datenschutz|privacy-policy)"#)
        .map(|re| re.is_match(body))
        .unwrap_or(false)
}

fn has_lang_attribute(body: &str) -> bool {
    Regex::new(r#"(?i)<html[^>]+lang=["'][a-z]"#)
        .map(|re| re.is_match(body))
        .unwrap_or(false)
}

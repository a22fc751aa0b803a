use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::core::engine::{ScanContext, Scanner, ScannerOutput};
use crate::core::issue::{RawIssue, Severity};

/// CMS fingerprinting. Currently WordPress only, which covers the large
/// majority of CMS-built customer sites.
pub struct CmsScanner;

#[async_trait]
impl Scanner for CmsScanner {
    fn name(&self) -> &'static str {
        "cms"
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<ScannerOutput> {
        let body = &ctx.snapshot.body;
        let mut issues = Vec::new();

        if !is_wordpress(body) {
            return Ok(ScannerOutput { issues });
        }

        if let Some(version) = generator_version(body) {
            issues.push(
                RawIssue::new(
                    "wp-version-disclosure",
                    Severity::Medium,
                    &format!("WordPress version {} is disclosed via the generator meta tag", version),
                )
                .with_location("generator meta tag"),
            );
        }

        if body.contains("/wp-json/") {
            issues.push(RawIssue::new(
                "wp-rest-api-exposed",
                Severity::Low,
                "WordPress REST API endpoint is advertised in the page source",
            ));
        }

        if body.contains("/xmlrpc.php") {
            issues.push(RawIssue::new(
                "wp-xmlrpc-advertised",
                Severity::Low,
                "xmlrpc.php is referenced; it enables credential brute-forcing amplification",
            ));
        }

        Ok(ScannerOutput { issues })
    }
}

fn is_wordpress(body: &str) -> bool {
    body.contains("wp-content") || body.contains("wp-includes")
}

fn generator_version(body: &str) -> Option<String> {
    Regex::new(r#"(?i)<meta[^>]+name=["']generator["'][^>]+content=["']WordPress ([0-9.]+)"#)
        .ok()?
        .captures(body)
        .map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::test_context;

    #[tokio::test]
    async fn test_non_wordpress_site_is_quiet() {
        let ctx = test_context("<html><body>Plain site</body></html>", &[]);
        let output = CmsScanner.scan(&ctx).await.unwrap();
        assert!(output.issues.is_empty());
    }

    #[tokio::test]
    async fn test_version_disclosure_is_flagged() {
        let body = r#"
            <meta name="generator" content="WordPress 6.1.1">
            <link href="/wp-content/themes/x/style.css">
        "#;
        let ctx = test_context(body, &[]);
        let output = CmsScanner.scan(&ctx).await.unwrap();

        assert_eq!(output.issues.len(), 1);
        assert_eq!(output.issues[0].issue_type.as_deref(), Some("wp-version-disclosure"));
        assert!(output.issues[0]
            .description
            .as_deref()
            .unwrap()
            .contains("6.1.1"));
    }

    #[tokio::test]
    async fn test_wordpress_without_generator_is_quiet() {
        let ctx = test_context(r#"<link href="/wp-content/themes/x/style.css">"#, &[]);
        let output = CmsScanner.scan(&ctx).await.unwrap();
        assert!(output.issues.is_empty());
    }

    #[test]
    fn test_generator_version_extraction() {
        assert_eq!(
            generator_version(r#"<meta name="generator" content="WordPress 6.2">"#),
            Some("6.2".to_string())
        );
        assert_eq!(generator_version(r#"<meta name="generator" content="Hugo 0.110">"#), None);
    }
}

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::core::engine::{ScanContext, Scanner, ScannerOutput};
use crate::core::issue::{RawIssue, Severity};

/// Transport security: plaintext HTTP and mixed content.
pub struct TlsScanner;

#[async_trait]
impl Scanner for TlsScanner {
    fn name(&self) -> &'static str {
        "tls"
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<ScannerOutput> {
        let mut issues = Vec::new();

        if ctx.target.scheme() == "http" {
            issues.push(RawIssue::new(
                "missing-ssl-certificate",
                Severity::Critical,
                "Site is served over plaintext HTTP",
            ));
        } else {
            for resource in mixed_content_resources(&ctx.snapshot.body) {
                issues.push(
                    RawIssue::new(
                        "mixed-content",
                        Severity::Medium,
                        "HTTPS page loads a subresource over plaintext HTTP",
                    )
                    .with_location(&resource),
                );
            }
        }

        Ok(ScannerOutput { issues })
    }
}

/// Plaintext subresource URLs referenced from src/href attributes.
fn mixed_content_resources(body: &str) -> Vec<String> {
    let re = match Regex::new(r#"(?i)(?:src|href)=["'](http://[^"']+)["']"#) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    re.captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::test_context;
    use url::Url;

    #[tokio::test]
    async fn test_http_scheme_is_critical() {
        let mut ctx = test_context("", &[]);
        ctx.target = Url::parse("http://example.com/").unwrap();
        let output = TlsScanner.scan(&ctx).await.unwrap();

        assert_eq!(output.issues.len(), 1);
        assert_eq!(output.issues[0].issue_type.as_deref(), Some("missing-ssl-certificate"));
        assert_eq!(output.issues[0].severity.as_deref(), Some("critical"));
    }

    #[tokio::test]
    async fn test_mixed_content_is_flagged_per_resource() {
        let body = r#"
            <script src="http://cdn.example.com/app.js"></script>
            <link href="https://example.com/ok.css">
            <img src='http://img.example.com/logo.png'>
        "#;
        let ctx = test_context(body, &[]);
        let output = TlsScanner.scan(&ctx).await.unwrap();

        assert_eq!(output.issues.len(), 2);
        assert_eq!(output.issues[0].location.as_deref(), Some("http://cdn.example.com/app.js"));
    }

    #[tokio::test]
    async fn test_clean_https_page_is_quiet() {
        let ctx = test_context(r#"<script src="https://cdn.example.com/app.js"></script>"#, &[]);
        let output = TlsScanner.scan(&ctx).await.unwrap();
        assert!(output.issues.is_empty());
    }
}

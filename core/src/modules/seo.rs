use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::core::engine::{ScanContext, Scanner, ScannerOutput};
use crate::core::issue::{RawIssue, Severity};

/// On-page SEO checks against the fetched HTML.
pub struct SeoScanner;

/// Per-page cap on repeated findings of the same check (alt text); a
/// gallery page with 300 bare images should not drown the report.
const MAX_ALT_TEXT_FINDINGS: usize = 10;

#[async_trait]
impl Scanner for SeoScanner {
    fn name(&self) -> &'static str {
        "seo"
    }

    async fn scan(&self, ctx: &ScanContext) -> Result<ScannerOutput> {
        let body = &ctx.snapshot.body;
        let mut issues = Vec::new();

        if !has_nonempty_title(body) {
            issues.push(RawIssue::new(
                "missing-title-tag",
                Severity::Medium,
                "Page has no usable <title> element",
            ));
        }

        if !matches(body, r#"(?i)<meta[^>]+name=["']description["']"#) {
            issues.push(RawIssue::new(
                "missing-meta-description",
                Severity::Medium,
                "Page has no meta description",
            ));
        }

        if !matches(body, r#"(?i)<link[^>]+rel=["']canonical["']"#) {
            issues.push(RawIssue::new(
                "missing-canonical-tag",
                Severity::Low,
                "No canonical URL declared",
            ));
        }

        if !matches(body, r"(?i)application/ld\+json") {
            issues.push(RawIssue::new(
                "missing-schema-markup",
                Severity::Medium,
                "No JSON-LD structured data found",
            ));
        }

        if !matches(body, r#"(?i)<meta[^>]+name=["']viewport["']"#) {
            issues.push(RawIssue::new(
                "missing-viewport-meta",
                Severity::Medium,
                "No viewport meta tag; page will render poorly on mobile",
            ));
        }

        if !matches(body, r#"(?i)property=["']og:"#) {
            issues.push(RawIssue::new(
                "missing-open-graph-tags",
                Severity::Low,
                "No Open Graph tags; shared links lose their preview",
            ));
        }

        match count_matches(body, r"(?i)<h1[\s>]") {
            0 => issues.push(RawIssue::new(
                "missing-h1-heading",
                Severity::Low,
                "Page has no <h1> heading",
            )),
            1 => {}
            n => issues.push(RawIssue::new(
                "multiple-h1-headings",
                Severity::Low,
                &format!("Page has {} <h1> headings, expected one", n),
            )),
        }

        for src in images_without_alt(body).into_iter().take(MAX_ALT_TEXT_FINDINGS) {
            issues.push(
                RawIssue::new("missing-alt-text", Severity::Low, "Image has no alt attribute")
                    .with_location(&src),
            );
        }

        Ok(ScannerOutput { issues })
    }
}

fn matches(body: &str, pattern: &str) -> bool {
    Regex::new(pattern).map(|re| re.is_match(body)).unwrap_or(false)
}

fn count_matches(body: &str, pattern: &str) -> usize {
    Regex::new(pattern).map(|re| re.find_iter(body).count()).unwrap_or(0)
}

fn has_nonempty_title(body: &str) -> bool {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>")
        .ok()
        .and_then(|re| re.captures(body))
        .map(|c| !c[1].trim().is_empty())
        .unwrap_or(false)
}

/// src attributes of <img> tags lacking an alt attribute.
fn images_without_alt(body: &str) -> Vec<String> {
    let img_re = match Regex::new(r"(?i)<img[^>]*>") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let src_re = Regex::new(r#"(?i)src=["']([^"']+)["']"#).ok();

    img_re
        .find_iter(body)
        .filter(|tag| !tag.as_str().to_lowercase().contains("alt="))
        .map(|tag| {
            src_re
                .as_ref()
                .and_then(|re| re.captures(tag.as_str()))
                .map(|c| c[1].to_string())
                .unwrap_or_else(|| "unknown image".to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::test_context;

    const COMPLETE_PAGE: &str = r#"
        <html><head>
        <title>Example product</title>
        <meta name="description" content="A fine product">
        <meta name="viewport" content="width=device-width, initial-scale=1">
        <meta property="og:title" content="Example">
        <link rel="canonical" href="https://example.com/">
        <script type="application/ld+json">{"@context":"https://schema.org"}</script>
        </head><body>
        <h1>Example</h1>
        <img src="hero.png" alt="Hero">
        </body></html>
    "#;

    #[tokio::test]
    async fn test_complete_page_is_quiet() {
        let ctx = test_context(COMPLETE_PAGE, &[]);
        let output = SeoScanner.scan(&ctx).await.unwrap();
        assert!(output.issues.is_empty(), "unexpected: {:?}", output.issues);
    }

    #[tokio::test]
    async fn test_empty_page_flags_the_basics() {
        let ctx = test_context("<html><body></body></html>", &[]);
        let output = SeoScanner.scan(&ctx).await.unwrap();
        let types: Vec<&str> = output.issues.iter().filter_map(|i| i.issue_type.as_deref()).collect();

        assert!(types.contains(&"missing-title-tag"));
        assert!(types.contains(&"missing-meta-description"));
        assert!(types.contains(&"missing-canonical-tag"));
        assert!(types.contains(&"missing-schema-markup"));
        assert!(types.contains(&"missing-viewport-meta"));
        assert!(types.contains(&"missing-h1-heading"));
    }

    #[tokio::test]
    async fn test_empty_title_counts_as_missing() {
        let ctx = test_context("<title>   </title>", &[]);
        let output = SeoScanner.scan(&ctx).await.unwrap();
        assert!(output
            .issues
            .iter()
            .any(|i| i.issue_type.as_deref() == Some("missing-title-tag")));
    }

    #[tokio::test]
    async fn test_multiple_h1_headings() {
        let ctx = test_context("<h1>One</h1><h1>Two</h1>", &[]);
        let output = SeoScanner.scan(&ctx).await.unwrap();
        assert!(output
            .issues
            .iter()
            .any(|i| i.issue_type.as_deref() == Some("multiple-h1-headings")));
    }

    #[test]
    fn test_images_without_alt_reports_src() {
        let body = r#"
            <img src="a.png" alt="ok">
            <img src="b.png">
            <img src='c.png' class="x">
        "#;
        let found = images_without_alt(body);
        assert_eq!(found, vec!["b.png".to_string(), "c.png".to_string()]);
    }

    #[tokio::test]
    async fn test_alt_text_findings_are_capped() {
        let body: String = (0..50).map(|i| format!("<img src=\"{}.png\">", i)).collect();
        let ctx = test_context(&body, &[]);
        let output = SeoScanner.scan(&ctx).await.unwrap();
        let alt_findings = output
            .issues
            .iter()
            .filter(|i| i.issue_type.as_deref() == Some("missing-alt-text"))
            .count();
        assert_eq!(alt_findings, MAX_ALT_TEXT_FINDINGS);
    }
}

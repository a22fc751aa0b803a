//! Synthesized remediation advice for well-known issue types.
//!
//! The display and PDF surfaces read `issue.fix` when present; this table
//! fills it in for the built-in scanner vocabulary. Issues from foreign
//! scanners keep whatever fix they arrived with.

use crate::core::category::Dimension;
use crate::core::issue::Fix;
use crate::core::report::Report;

/// Looks up a suggested fix for a known issue type.
pub fn fix_for(issue_type: &str) -> Option<Fix> {
    let fix = |title: &str, description: &str, code: &str| Fix {
        title: title.to_string(),
        description: description.to_string(),
        code: code.to_string(),
    };

    match issue_type {
        "missing-ssl-certificate" => Some(fix(
            "Serve the site over HTTPS",
            "Obtain a TLS certificate (e.g. Let's Encrypt) and redirect all HTTP traffic to HTTPS.",
            "server {\n  listen 443 ssl;\n  ssl_certificate /etc/ssl/fullchain.pem;\n}",
        )),
        "missing-hsts-header" => Some(fix(
            "Enable HTTP Strict Transport Security",
            "Send the Strict-Transport-Security header so browsers refuse downgraded connections.",
            "Strict-Transport-Security: max-age=63072000; includeSubDomains",
        )),
        "missing-csp-header" => Some(fix(
            "Add a Content-Security-Policy",
            "Define a CSP to restrict where scripts and other resources may load from.",
            "Content-Security-Policy: default-src 'self'",
        )),
        "missing-x-frame-options-header" => Some(fix(
            "Prevent clickjacking",
            "Send X-Frame-Options to stop the site being embedded in hostile frames.",
            "X-Frame-Options: DENY",
        )),
        "missing-x-content-type-options-header" => Some(fix(
            "Disable MIME sniffing",
            "Send X-Content-Type-Options so browsers honor declared content types.",
            "X-Content-Type-Options: nosniff",
        )),
        "mixed-content" => Some(fix(
            "Eliminate mixed content",
            "Load every script, style, and image over HTTPS; http:// subresources are blocked or downgraded by browsers.",
            "<script src=\"https://example.com/app.js\"></script>",
        )),
        "exposed-sensitive-file" => Some(fix(
            "Block access to sensitive files",
            "Deny web access to dotfiles, backups, and configuration files at the server level.",
            "location ~ /\\.(env|git) { deny all; }",
        )),
        "exposed-secret" => Some(fix(
            "Remove leaked credentials",
            "Strip secrets from public pages and rotate every exposed key immediately.",
            "",
        )),
        "missing-title-tag" => Some(fix(
            "Add a page title",
            "Every page needs a unique, descriptive <title> under 60 characters.",
            "<title>Product name | what it does</title>",
        )),
        "missing-meta-description" => Some(fix(
            "Add a meta description",
            "Summarize the page in 150-160 characters for search result snippets.",
            "<meta name=\"description\" content=\"...\">",
        )),
        "missing-canonical-tag" => Some(fix(
            "Declare a canonical URL",
            "Point duplicate or parameterized URLs at the canonical version.",
            "<link rel=\"canonical\" href=\"https://example.com/page\">",
        )),
        "missing-schema-markup" => Some(fix(
            "Add structured data",
            "Embed JSON-LD schema.org markup so search engines understand the page.",
            "<script type=\"application/ld+json\">{\"@context\":\"https://schema.org\"}</script>",
        )),
        "missing-alt-text" => Some(fix(
            "Add alt text to images",
            "Describe each meaningful image in its alt attribute.",
            "<img src=\"hero.png\" alt=\"Team photo at launch\">",
        )),
        "missing-viewport-meta" => Some(fix(
            "Add a viewport meta tag",
            "Declare the viewport so the page renders correctly on mobile.",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
        )),
        "missing-response-compression" => Some(fix(
            "Enable response compression",
            "Serve text assets with gzip or brotli compression.",
            "gzip on;\ngzip_types text/html text/css application/javascript;",
        )),
        "missing-cache-policy" => Some(fix(
            "Set caching headers",
            "Give static assets a long-lived Cache-Control policy.",
            "Cache-Control: public, max-age=31536000, immutable",
        )),
        "missing-cookie-consent" => Some(fix(
            "Add a consent banner",
            "Ask for consent before setting non-essential cookies (GDPR/ePrivacy).",
            "",
        )),
        "missing-privacy-policy" => Some(fix(
            "Link a privacy policy",
            "Provide a reachable privacy policy describing data processing.",
            "<a href=\"/privacy\">Privacy policy</a>",
        )),
        "missing-lang-attribute" => Some(fix(
            "Declare the document language",
            "Set the lang attribute on <html> for assistive technologies (WCAG 3.1.1).",
            "<html lang=\"en\">",
        )),
        "wp-version-disclosure" => Some(fix(
            "Hide the WordPress version",
            "Remove the generator meta tag; attackers use it to pick exploits.",
            "remove_action('wp_head', 'wp_generator');",
        )),
        _ => None,
    }
}

/// Fills in missing fixes across all dimensions, then rebuilds the flat
/// issue list so both views stay consistent.
pub fn attach_fixes(report: &mut Report) {
    for dimension in Dimension::ALL {
        for issue in &mut report.dimension_mut(dimension).issues {
            if issue.fix.is_none() {
                issue.fix = fix_for(&issue.issue_type);
            }
        }
    }
    report.issues = Dimension::ALL
        .iter()
        .flat_map(|d| report.dimension(*d).issues.iter().cloned())
        .collect();
}

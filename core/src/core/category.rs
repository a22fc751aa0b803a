use serde::{Deserialize, Serialize};

/// The four fixed report dimensions. Every surviving issue is classified
/// into exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Security,
    Seo,
    Performance,
    Compliance,
}

impl Dimension {
    /// Fixed dimension order used for bucket iteration and the flat
    /// legacy issue list.
    pub const ALL: [Dimension; 4] = [
        Dimension::Security,
        Dimension::Seo,
        Dimension::Performance,
        Dimension::Compliance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Security => "security",
            Dimension::Seo => "seo",
            Dimension::Performance => "performance",
            Dimension::Compliance => "compliance",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keyword-based categorization rules.
///
/// Predicates are evaluated in list order with first-match-wins, so the
/// ordering itself encodes the cross-exclusions: performance never claims
/// a type that SEO or security already matched (e.g. "mobile-optimization"
/// belongs to SEO even though it smells like performance).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRules {
    ordered: Vec<(Dimension, Vec<String>)>,
    /// Where uncategorized issues land. Product focus has shifted over
    /// time (security early on, SEO today), so this is configuration,
    /// not a hardcoded branch.
    pub default_dimension: Dimension,
}

impl Default for CategoryRules {
    fn default() -> Self {
        let keywords = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        Self {
            ordered: vec![
                (
                    Dimension::Seo,
                    keywords(&[
                        "schema",
                        "canonical",
                        "open-graph",
                        "og-",
                        "meta-description",
                        "title-tag",
                        "alt-text",
                        "sitemap",
                        "robots",
                        "e-a-t",
                        "heading",
                        "h1",
                        "viewport",
                        "mobile-optimization",
                        "internal-link",
                        "crawl",
                    ]),
                ),
                (
                    Dimension::Security,
                    keywords(&[
                        "ssl",
                        "tls",
                        "certificate",
                        "cipher",
                        "csrf",
                        "xss",
                        "hsts",
                        "csp",
                        "header",
                        "wp-",
                        "injection",
                        "secret",
                        "exposed",
                        "mixed-content",
                        "clickjacking",
                        "vulnerab",
                        "cookie-secure",
                    ]),
                ),
                (
                    Dimension::Performance,
                    keywords(&[
                        "compress",
                        "render-blocking",
                        "webp",
                        "image-size",
                        "cach",
                        "minif",
                        "lazy-load",
                        "page-size",
                        "speed",
                        "load-time",
                        "ttfb",
                    ]),
                ),
                (
                    Dimension::Compliance,
                    keywords(&[
                        "gdpr",
                        "wcag",
                        "consent",
                        "privacy",
                        "accessib",
                        "cookie-banner",
                        "impressum",
                        "lang-attribute",
                        "legal",
                    ]),
                ),
            ],
            default_dimension: Dimension::Seo,
        }
    }
}

impl CategoryRules {
    /// Maps an issue type onto exactly one dimension. Total and pure:
    /// any input, including garbage, yields a valid dimension, and
    /// re-categorizing an already-categorized type is a no-op.
    pub fn categorize(&self, issue_type: &str) -> Dimension {
        let needle = issue_type.trim().to_lowercase();
        if needle.is_empty() {
            return self.default_dimension;
        }
        for (dimension, words) in &self.ordered {
            if words.iter().any(|w| needle.contains(w.as_str())) {
                return *dimension;
            }
        }
        self.default_dimension
    }
}

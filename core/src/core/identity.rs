//! Deduplication identity for findings.
//!
//! Type alone would over-merge distinct findings of the same check (two
//! different images missing alt text), while the full description would
//! under-merge near-identical findings that differ only in whitespace or
//! casing. The identity is therefore a normalized composite of the type,
//! a description prefix, and a location prefix.

use crate::core::issue::Issue;

const IDENTITY_MAX_LEN: usize = 80;
const DESCRIPTION_PREFIX_LEN: usize = 30;
const LOCATION_PREFIX_LEN: usize = 20;

/// Derives the stable dedup key for a normalized issue. Deterministic:
/// equivalent issues always map to the same key.
pub fn issue_identity(issue: &Issue) -> String {
    let type_part = scrub(&issue.issue_type);
    let desc_part = scrub(&char_prefix(&issue.description, DESCRIPTION_PREFIX_LEN));
    let loc_part = scrub(&char_prefix(
        issue.location.as_deref().unwrap_or(""),
        LOCATION_PREFIX_LEN,
    ));

    let key = format!("{}-{}-{}", type_part, desc_part, loc_part);
    char_prefix(&key, IDENTITY_MAX_LEN)
}

/// Unique identity for findings that cannot produce a real key (no type).
/// The aggregator drops typeless findings before keying, so this is for
/// embedders deduplicating streams that bypass normalization. Distinct on
/// every call, so two fallback identities never dedup against each other.
pub fn fallback_identity() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    format!("issue-unknown-{}-{}", millis, rand::random::<u32>())
}

/// Lowercases and strips everything that is not ASCII alphanumeric.
fn scrub(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn char_prefix(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}

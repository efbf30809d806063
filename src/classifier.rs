//! Keyword-based severity classification.
//!
//! Title and summary are lower-cased and checked for plain substring matches
//! against fixed keyword tables, highest tier first.

use crate::models::Severity;

pub const CRITICAL_KEYWORDS: &[&str] = &[
    "zero-day",
    "critical vulnerability",
    "ransomware",
    "data breach",
    "nation-state",
    "apt",
    "supply chain",
];

pub const HIGH_KEYWORDS: &[&str] = &[
    "vulnerability",
    "malware",
    "phishing",
    "exploit",
    "backdoor",
    "trojan",
    "botnet",
];

pub const MEDIUM_KEYWORDS: &[&str] = &[
    "patch",
    "update",
    "security advisory",
    "warning",
    "alert",
    "suspicious",
];

/// Informational only: anything that misses the other tables is low.
pub const LOW_KEYWORDS: &[&str] = &[
    "announcement",
    "release",
    "feature",
    "improvement",
    "maintenance",
];

const TIERS: [(Severity, &[&str]); 3] = [
    (Severity::Critical, CRITICAL_KEYWORDS),
    (Severity::High, HIGH_KEYWORDS),
    (Severity::Medium, MEDIUM_KEYWORDS),
];

pub fn classify(title: &str, summary: &str) -> Severity {
    let text = format!("{} {}", title, summary).to_lowercase();

    TIERS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|(severity, _)| *severity)
        .unwrap_or(Severity::Low)
}

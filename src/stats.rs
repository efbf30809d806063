use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Article, Severity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityBreakdown {
    pub fn from_articles<'a>(articles: impl IntoIterator<Item = &'a Article>) -> Self {
        let mut breakdown = SeverityBreakdown::default();
        for article in articles {
            match article.severity {
                Severity::Critical => breakdown.critical += 1,
                Severity::High => breakdown.high += 1,
                Severity::Medium => breakdown.medium += 1,
                Severity::Low => breakdown.low += 1,
            }
        }
        breakdown
    }
}

/// Overall threat level shown in the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn from_breakdown(breakdown: &SeverityBreakdown) -> Self {
        if breakdown.critical > 2 {
            ThreatLevel::Critical
        } else if breakdown.critical > 0 || breakdown.high > 5 {
            ThreatLevel::High
        } else if breakdown.high > 0 || breakdown.medium > 3 {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        }
    }

    /// Fill percentage of the header gauge.
    pub fn gauge_percent(&self) -> u8 {
        match self {
            ThreatLevel::Low => 25,
            ThreatLevel::Medium => 50,
            ThreatLevel::High => 75,
            ThreatLevel::Critical => 90,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_articles: usize,
    pub critical_threats: usize,
    pub active_sources: u32,
    pub recent_articles: usize,
    pub breakdown: SeverityBreakdown,
    pub threat_level: ThreatLevel,
    /// Header gauge fill, 0-100
    pub threat_gauge: u8,
}

impl DashboardStats {
    pub fn compute(articles: &[Article], active_sources: u32, now: DateTime<Utc>) -> Self {
        let breakdown = SeverityBreakdown::from_articles(articles);
        let cutoff = now - Duration::hours(24);
        let recent_articles = articles.iter().filter(|a| a.published_at > cutoff).count();
        let threat_level = ThreatLevel::from_breakdown(&breakdown);

        DashboardStats {
            total_articles: articles.len(),
            critical_threats: breakdown.critical,
            active_sources,
            recent_articles,
            breakdown,
            threat_level,
            threat_gauge: threat_level.gauge_percent(),
        }
    }
}

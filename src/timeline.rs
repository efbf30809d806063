//! Hourly article counts over the last 24 hours.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::Article;

pub const BUCKET_COUNT: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketColor {
    Critical,
    Danger,
    Warning,
    Success,
}

impl BucketColor {
    fn for_ratio(ratio: f64) -> Self {
        if ratio > 0.8 {
            BucketColor::Critical
        } else if ratio > 0.6 {
            BucketColor::Danger
        } else if ratio > 0.4 {
            BucketColor::Warning
        } else {
            BucketColor::Success
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: usize,
    pub color: BucketColor,
}

/// Buckets `articles` into 24 one-hour windows, oldest first. Bucket `i`
/// covers `[now - (24 - i)h, now - (23 - i)h)`.
pub fn aggregate(articles: &[Article], now: DateTime<Utc>) -> Vec<TimelineBucket> {
    let windows: Vec<(DateTime<Utc>, DateTime<Utc>)> = (0..BUCKET_COUNT as i64)
        .map(|i| {
            let start = now - Duration::hours(BUCKET_COUNT as i64 - i);
            (start, start + Duration::hours(1))
        })
        .collect();

    let counts: Vec<usize> = windows
        .iter()
        .map(|(start, end)| {
            articles
                .iter()
                .filter(|a| a.published_at >= *start && a.published_at < *end)
                .count()
        })
        .collect();

    let max = counts.iter().copied().max().unwrap_or(0).max(1);

    windows
        .into_iter()
        .zip(counts)
        .map(|((start, end), count)| TimelineBucket {
            start,
            end,
            count,
            color: BucketColor::for_ratio(count as f64 / max as f64),
        })
        .collect()
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::classifier;
use crate::error::DashboardError;
use crate::stats::SeverityBreakdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown severity '{0}'")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// Publication time as sent by the feed endpoint: an ISO-8601 string or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(i64),
    /// Epoch milliseconds encoded as a JSON float, e.g. `1729495680000.0`
    FractionalEpoch(f64),
    Text(String),
}

impl RawTimestamp {
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Epoch(millis) => DateTime::from_timestamp_millis(*millis),
            RawTimestamp::FractionalEpoch(millis) => {
                if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
                    return None;
                }
                DateTime::from_timestamp_millis(millis.trunc() as i64)
            }
            RawTimestamp::Text(text) => parse_timestamp(text),
        }
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    // The backend emits naive timestamps; read them as UTC.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Feed item as sent by the backend. Empty RSS elements arrive as `null`
/// and read as empty strings.
#[derive(Debug, Clone, Deserialize)]
pub struct RawArticle {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub link: String,
    #[serde(default)]
    pub published: Option<RawTimestamp>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Items stay as raw JSON until [`FeedBatch`] decodes them one by one, so a
/// single bad item cannot sink the whole payload.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedResponse {
    pub success: bool,
    #[serde(default)]
    pub articles: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub successful_feeds: u32,
    #[serde(default)]
    pub total_feeds: u32,
    #[serde(default)]
    pub message: Option<String>,
}

/// A feed payload that passed validation.
#[derive(Debug, Clone)]
pub struct FeedBatch {
    pub articles: Vec<RawArticle>,
    pub sources: Vec<String>,
    pub successful_feeds: u32,
    pub total_feeds: u32,
}

impl TryFrom<FeedResponse> for FeedBatch {
    type Error = DashboardError;

    fn try_from(response: FeedResponse) -> Result<Self, Self::Error> {
        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| "Failed to load feeds".to_string());
            return Err(DashboardError::MalformedResponse(message));
        }

        let items = response.articles.ok_or_else(|| {
            DashboardError::MalformedResponse("response is missing 'articles'".to_string())
        })?;

        let articles = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<RawArticle>(item) {
                Ok(article) => Some(article),
                Err(e) => {
                    warn!("Skipping feed item {}: {}", index, e);
                    None
                }
            })
            .collect();

        Ok(FeedBatch {
            articles,
            sources: response.sources,
            successful_feeds: response.successful_feeds,
            total_feeds: response.total_feeds,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub source: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub severity: Severity,
}

impl Article {
    pub fn from_raw(raw: RawArticle) -> Result<Self, DashboardError> {
        let published_at = raw
            .published
            .as_ref()
            .and_then(RawTimestamp::parse)
            .ok_or_else(|| {
                DashboardError::MalformedResponse(format!(
                    "article '{}' has an unreadable publish time",
                    raw.id
                ))
            })?;
        let severity = classifier::classify(&raw.title, raw.summary.as_deref().unwrap_or(""));

        Ok(Article {
            id: raw.id,
            title: raw.title,
            summary: raw.summary,
            source: raw.source,
            link: raw.link,
            published_at,
            severity,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRequest {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub source: String,
    pub severity: Severity,
    pub link: String,
    pub published: String,
}

impl From<&Article> for SummaryRequest {
    fn from(article: &Article) -> Self {
        SummaryRequest {
            id: article.id.clone(),
            title: article.title.clone(),
            summary: article.summary.clone(),
            source: article.source.clone(),
            severity: article.severity,
            link: article.link.clone(),
            published: article.published_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyBriefRequest {
    pub articles: Vec<SummaryRequest>,
    pub date: String,
    pub total_threats: usize,
    pub severity_breakdown: SeverityBreakdown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyBriefResponse {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub cached: bool,
}

/// Text returned to callers of the summary and daily-brief actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryOutcome {
    pub summary: String,
    /// True when served from the local cache or reported cached upstream.
    pub cached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(id: &str, title: &str, summary: Option<&str>, published: RawTimestamp) -> RawArticle {
        RawArticle {
            id: id.to_string(),
            title: title.to_string(),
            summary: summary.map(|s| s.to_string()),
            source: "Krebs on Security".to_string(),
            link: format!("https://example.com/{}", id),
            published: Some(published),
        }
    }

    mod severity_tests {
        use super::*;

        #[test]
        fn test_parse_is_case_insensitive() {
            assert_eq!("CRITICAL".parse::<Severity>(), Ok(Severity::Critical));
            assert_eq!(" high ".parse::<Severity>(), Ok(Severity::High));
            assert_eq!("Medium".parse::<Severity>(), Ok(Severity::Medium));
            assert_eq!("low".parse::<Severity>(), Ok(Severity::Low));
        }

        #[test]
        fn test_parse_unknown() {
            assert!("severe".parse::<Severity>().is_err());
        }

        #[test]
        fn test_serializes_lowercase() {
            let json = serde_json::to_string(&Severity::Critical).unwrap();
            assert_eq!(json, "\"critical\"");
        }
    }

    mod timestamp_tests {
        use super::*;

        #[test]
        fn test_rfc3339_with_offset() {
            let ts = RawTimestamp::Text("2024-10-21T09:28:00+02:00".to_string());
            assert_eq!(
                ts.parse(),
                Some(Utc.with_ymd_and_hms(2024, 10, 21, 7, 28, 0).unwrap())
            );
        }

        #[test]
        fn test_naive_timestamp_is_utc() {
            let ts = RawTimestamp::Text("2024-10-21T07:28:00".to_string());
            assert_eq!(
                ts.parse(),
                Some(Utc.with_ymd_and_hms(2024, 10, 21, 7, 28, 0).unwrap())
            );
        }

        #[test]
        fn test_naive_timestamp_with_fraction() {
            let ts = RawTimestamp::Text("2024-10-21T07:28:00.123456".to_string());
            let parsed = ts.parse().unwrap();
            assert_eq!(parsed.timestamp(), 1_729_495_680);
        }

        #[test]
        fn test_rfc2822() {
            let ts = RawTimestamp::Text("Mon, 21 Oct 2024 07:28:00 GMT".to_string());
            assert_eq!(
                ts.parse(),
                Some(Utc.with_ymd_and_hms(2024, 10, 21, 7, 28, 0).unwrap())
            );
        }

        #[test]
        fn test_date_only() {
            let ts = RawTimestamp::Text("2024-10-21".to_string());
            assert_eq!(
                ts.parse(),
                Some(Utc.with_ymd_and_hms(2024, 10, 21, 0, 0, 0).unwrap())
            );
        }

        #[test]
        fn test_epoch_millis() {
            let ts = RawTimestamp::Epoch(1_729_495_680_000);
            assert_eq!(
                ts.parse(),
                Some(Utc.with_ymd_and_hms(2024, 10, 21, 7, 28, 0).unwrap())
            );
        }

        #[test]
        fn test_fractional_epoch_out_of_range() {
            assert_eq!(RawTimestamp::FractionalEpoch(f64::NAN).parse(), None);
            assert_eq!(RawTimestamp::FractionalEpoch(1e300).parse(), None);
        }

        #[test]
        fn test_garbage_is_rejected() {
            assert_eq!(RawTimestamp::Text("yesterday-ish".to_string()).parse(), None);
            assert_eq!(RawTimestamp::Text("".to_string()).parse(), None);
        }

        #[test]
        fn test_deserialize_untagged() {
            let text: RawTimestamp = serde_json::from_str("\"2024-10-21\"").unwrap();
            assert_eq!(text, RawTimestamp::Text("2024-10-21".to_string()));

            let epoch: RawTimestamp = serde_json::from_str("1729495680000").unwrap();
            assert_eq!(epoch, RawTimestamp::Epoch(1_729_495_680_000));
        }
    }

    mod article_tests {
        use super::*;

        #[test]
        fn test_from_raw_classifies() {
            let article = Article::from_raw(raw(
                "a1",
                "New ransomware strain",
                Some("Hospitals hit"),
                RawTimestamp::Text("2024-10-21T07:28:00Z".to_string()),
            ))
            .unwrap();

            assert_eq!(article.severity, Severity::Critical);
            assert_eq!(article.id, "a1");
        }

        #[test]
        fn test_from_raw_without_summary() {
            let article = Article::from_raw(raw(
                "a2",
                "Vendor ships patch",
                None,
                RawTimestamp::Text("2024-10-21T07:28:00Z".to_string()),
            ))
            .unwrap();

            assert_eq!(article.severity, Severity::Medium);
            assert!(article.summary.is_none());
        }

        #[test]
        fn test_from_raw_bad_timestamp() {
            let result = Article::from_raw(raw(
                "a3",
                "Anything",
                None,
                RawTimestamp::Text("not a date".to_string()),
            ));
            assert!(matches!(result, Err(DashboardError::MalformedResponse(_))));
        }

        #[test]
        fn test_classification_is_deterministic() {
            let input = raw(
                "a4",
                "Botnet grows",
                Some("Operators push new trojan"),
                RawTimestamp::Epoch(0),
            );
            let first = Article::from_raw(input.clone()).unwrap();
            let second = Article::from_raw(input).unwrap();
            assert_eq!(first.severity, second.severity);
            assert_eq!(first.severity, Severity::High);
        }

        #[test]
        fn test_summary_request_from_article() {
            let article = Article::from_raw(raw(
                "a5",
                "Phishing wave",
                Some("Fake invoices"),
                RawTimestamp::Text("2024-10-21T07:28:00Z".to_string()),
            ))
            .unwrap();

            let request = SummaryRequest::from(&article);
            let json = serde_json::to_value(&request).unwrap();

            assert_eq!(json["id"], "a5");
            assert_eq!(json["severity"], "high");
            assert_eq!(json["published"], "2024-10-21T07:28:00+00:00");
            assert_eq!(json["summary"], "Fake invoices");
        }
    }

    mod feed_response_tests {
        use super::*;

        #[test]
        fn test_valid_payload() {
            let json = r#"{
                "success": true,
                "articles": [
                    {"id": "x_0", "title": "T", "source": "S", "link": "L", "published": "2024-10-21T07:28:00"}
                ],
                "sources": ["S"],
                "successful_feeds": 1,
                "total_feeds": 2
            }"#;
            let response: FeedResponse = serde_json::from_str(json).unwrap();
            let batch = FeedBatch::try_from(response).unwrap();

            assert_eq!(batch.articles.len(), 1);
            assert_eq!(batch.sources, vec!["S".to_string()]);
            assert_eq!(batch.successful_feeds, 1);
            assert_eq!(batch.total_feeds, 2);
        }

        #[test]
        fn test_success_false_surfaces_message() {
            let json = r#"{"success": false, "message": "upstream down"}"#;
            let response: FeedResponse = serde_json::from_str(json).unwrap();
            match FeedBatch::try_from(response) {
                Err(DashboardError::MalformedResponse(msg)) => assert_eq!(msg, "upstream down"),
                other => panic!("unexpected result: {:?}", other),
            }
        }

        #[test]
        fn test_bad_items_do_not_sink_the_batch() {
            let json = r#"{
                "success": true,
                "articles": [
                    {"id": "ok", "title": "T", "source": "S", "link": "L", "published": "2024-10-21T07:28:00"},
                    {"title": "no id", "source": "S", "link": "L", "published": "2024-10-21T07:28:00"},
                    {"id": 7, "title": "numeric id"},
                    "not an object"
                ],
                "sources": ["S"]
            }"#;
            let response: FeedResponse = serde_json::from_str(json).unwrap();
            let batch = FeedBatch::try_from(response).unwrap();

            assert_eq!(batch.articles.len(), 1);
            assert_eq!(batch.articles[0].id, "ok");
        }

        #[test]
        fn test_null_fields_are_tolerated() {
            let json = r#"{
                "success": true,
                "articles": [
                    {"id": "a", "title": null, "summary": null, "source": "S", "link": null, "published": null},
                    {"id": "b", "source": null}
                ]
            }"#;
            let response: FeedResponse = serde_json::from_str(json).unwrap();
            let batch = FeedBatch::try_from(response).unwrap();

            assert_eq!(batch.articles.len(), 2);
            assert_eq!(batch.articles[0].title, "");
            assert_eq!(batch.articles[0].link, "");
            assert!(batch.articles[0].published.is_none());
            assert_eq!(batch.articles[1].source, "");

            // Readable as items, but without a publish time they cannot be shown
            assert!(Article::from_raw(batch.articles[0].clone()).is_err());
        }

        #[test]
        fn test_float_epoch() {
            let json = r#"{"id": "f", "title": "T", "published": 1729495680000.0}"#;
            let raw: RawArticle = serde_json::from_str(json).unwrap();
            assert_eq!(raw.published, Some(RawTimestamp::FractionalEpoch(1_729_495_680_000.0)));

            let article = Article::from_raw(raw).unwrap();
            assert_eq!(
                article.published_at,
                Utc.with_ymd_and_hms(2024, 10, 21, 7, 28, 0).unwrap()
            );
        }

        #[test]
        fn test_missing_articles() {
            let json = r#"{"success": true, "sources": []}"#;
            let response: FeedResponse = serde_json::from_str(json).unwrap();
            assert!(matches!(
                FeedBatch::try_from(response),
                Err(DashboardError::MalformedResponse(_))
            ));
        }
    }
}

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::models::{
    DailyBriefRequest, DailyBriefResponse, FeedBatch, FeedResponse, SummaryOutcome,
    SummaryRequest, SummaryResponse,
};

/// Client for the backend's feed, summarize and daily-brief endpoints.
pub struct ApiClient {
    client: Client,
    feeds_url: String,
    summarize_url: String,
    daily_brief_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("ThreatStream/1.0 (Security Dashboard)")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            feeds_url: config.feeds_url(),
            summarize_url: config.summarize_url(),
            daily_brief_url: config.daily_brief_url(),
        }
    }

    pub async fn fetch_feeds(&self) -> Result<FeedBatch> {
        debug!("GET {}", self.feeds_url);
        let response = self.client.get(&self.feeds_url).send().await?;
        let payload: FeedResponse = decode(response).await?;
        let batch = FeedBatch::try_from(payload)?;

        info!(
            "Loaded {} articles from {}/{} feeds",
            batch.articles.len(),
            batch.successful_feeds,
            batch.total_feeds
        );
        Ok(batch)
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryOutcome> {
        debug!("POST {} for {}", self.summarize_url, request.id);
        let response = self
            .client
            .post(&self.summarize_url)
            .json(request)
            .send()
            .await?;
        let payload: SummaryResponse = decode(response).await?;

        non_empty(payload.summary, "no summary received from API").map(|summary| SummaryOutcome {
            summary,
            cached: payload.cached,
        })
    }

    pub async fn daily_brief(&self, request: &DailyBriefRequest) -> Result<SummaryOutcome> {
        debug!(
            "POST {} for {} ({} articles)",
            self.daily_brief_url,
            request.date,
            request.articles.len()
        );
        let response = self
            .client
            .post(&self.daily_brief_url)
            .json(request)
            .send()
            .await?;
        let payload: DailyBriefResponse = decode(response).await?;

        non_empty(payload.summary, "no daily brief received from API").map(|summary| {
            SummaryOutcome {
                summary,
                cached: payload.cached,
            }
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(DashboardError::Status(status));
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| DashboardError::MalformedResponse(e.to_string()))
}

fn non_empty(value: Option<String>, message: &str) -> Result<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| DashboardError::MalformedResponse(message.to_string()))
}

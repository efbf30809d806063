use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::cache::{CacheStats, SummaryCache};
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::filter::FilterCriteria;
use crate::models::{Article, DailyBriefRequest, SummaryOutcome, SummaryRequest};
use crate::scheduler::RefreshHandle;
use crate::state::{ArticleView, DashboardState, DashboardView, Intent};
use crate::stats::SeverityBreakdown;

/// Drives fetches, summaries and auto-refresh around a [`DashboardState`].
pub struct DashboardController {
    api: ApiClient,
    state: RwLock<DashboardState>,
    summaries: Mutex<SummaryCache>,
    briefs: Mutex<SummaryCache>,
    refresh_interval: Duration,
    auto_refresh: Mutex<Option<RefreshHandle>>,
}

impl DashboardController {
    pub fn new(config: &Config) -> Self {
        Self {
            api: ApiClient::new(config),
            state: RwLock::new(DashboardState::new()),
            summaries: Mutex::new(SummaryCache::with_expiry_hours(config.summary_cache_hours)),
            briefs: Mutex::new(SummaryCache::with_expiry_hours(config.summary_cache_hours)),
            refresh_interval: config.refresh_period(),
            auto_refresh: Mutex::new(None),
        }
    }

    /// Fetches the feed and replaces the article collection. On failure the
    /// previous collection is kept and the status goes offline.
    pub async fn refresh(&self) -> Result<()> {
        let seq = self.state.write().await.start_fetch();
        let result = self.api.fetch_feeds().await;

        let mut state = self.state.write().await;
        match result {
            Ok(batch) => {
                state.apply(Intent::FeedLoaded {
                    seq,
                    batch,
                    at: Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                error!("Feed refresh failed: {}", e);
                state.apply(Intent::FeedFailed {
                    seq,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Applies the intents in order under one write lock and returns the
    /// resulting view, so concurrent readers never see a half-applied batch.
    pub async fn dispatch_all(&self, intents: impl IntoIterator<Item = Intent>) -> DashboardView {
        let mut state = self.state.write().await;
        for intent in intents {
            state.apply(intent);
        }
        state.view(Utc::now())
    }

    pub async fn view(&self) -> DashboardView {
        self.state.read().await.view(Utc::now())
    }

    pub async fn filtered(&self, criteria: &FilterCriteria) -> Vec<ArticleView> {
        self.state.read().await.filtered(criteria, Utc::now())
    }

    pub async fn article(&self, id: &str) -> Result<Article> {
        self.state
            .read()
            .await
            .article(id)
            .cloned()
            .ok_or_else(|| DashboardError::NotFound(id.to_string()))
    }

    /// Returns the AI summary for an article, from cache when fresh. Failed
    /// requests leave the cache untouched.
    pub async fn request_summary(&self, id: &str) -> Result<SummaryOutcome> {
        let article = self.article(id).await?;

        if let Some(summary) = self.summaries.lock().await.get(id, Utc::now()) {
            info!("Using cached summary for {}", id);
            return Ok(SummaryOutcome {
                summary: summary.to_string(),
                cached: true,
            });
        }

        let outcome = self
            .api
            .summarize(&SummaryRequest::from(&article))
            .await
            .inspect_err(|e| error!("Summary request for {} failed: {}", id, e))?;

        self.summaries
            .lock()
            .await
            .put(id, outcome.summary.clone(), Utc::now());
        info!("Generated summary for {}", id);
        Ok(outcome)
    }

    /// Requests a brief covering every loaded article, cached per day and article count.
    pub async fn request_daily_brief(&self) -> Result<SummaryOutcome> {
        let now = Utc::now();
        let request = {
            let state = self.state.read().await;
            let articles = state.articles();
            DailyBriefRequest {
                articles: articles.iter().map(SummaryRequest::from).collect(),
                date: now.format("%Y-%m-%d").to_string(),
                total_threats: articles.len(),
                severity_breakdown: SeverityBreakdown::from_articles(articles),
            }
        };
        let key = format!("daily_brief_{}_{}", request.date, request.total_threats);

        if let Some(summary) = self.briefs.lock().await.get(&key, now) {
            info!("Using cached daily brief for {}", request.date);
            return Ok(SummaryOutcome {
                summary: summary.to_string(),
                cached: true,
            });
        }

        let outcome = self
            .api
            .daily_brief(&request)
            .await
            .inspect_err(|e| error!("Daily brief request failed: {}", e))?;

        self.briefs
            .lock()
            .await
            .put(key, outcome.summary.clone(), Utc::now());
        Ok(outcome)
    }

    /// Starts or stops the periodic refresh. Any previous timer is stopped
    /// first, so at most one is ever running.
    pub async fn set_auto_refresh(self: &Arc<Self>, enabled: bool) {
        let mut slot = self.auto_refresh.lock().await;
        if let Some(handle) = slot.take() {
            handle.stop();
        }

        if enabled {
            let controller = Arc::downgrade(self);
            *slot = Some(RefreshHandle::spawn(self.refresh_interval, move || {
                let controller = controller.clone();
                async move {
                    if let Some(controller) = controller.upgrade() {
                        info!("Starting scheduled feed refresh");
                        let _ = controller.refresh().await;
                    }
                }
            }));
            info!(
                "Auto-refresh enabled every {} minutes",
                self.refresh_interval.as_secs() / 60
            );
        } else {
            info!("Auto-refresh disabled");
        }

        self.state
            .write()
            .await
            .apply(Intent::SetAutoRefresh(enabled));
    }

    pub async fn auto_refresh_running(&self) -> bool {
        self.auto_refresh
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.summaries.lock().await.stats(Utc::now())
    }

    pub async fn clear_cache(&self) -> usize {
        let cleared = self.summaries.lock().await.clear();
        info!("Cleared {} cached summaries", cleared);
        cleared
    }
}

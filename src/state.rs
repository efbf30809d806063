//! Application state and the intents that change it.
//!
//! Every mutation goes through [`DashboardState::apply`]; readers take a
//! [`DashboardView`] snapshot computed for a given instant.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::filter::{self, FilterCriteria};
use crate::models::{Article, FeedBatch, RawArticle, Severity};
use crate::stats::DashboardStats;
use crate::time_ago::time_ago;
use crate::timeline::{self, TimelineBucket};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FeedStatus {
    /// No fetch has completed yet
    Idle,
    Live {
        successful_feeds: u32,
        total_feeds: u32,
    },
    Offline {
        error: String,
    },
}

#[derive(Debug, Clone)]
pub enum Intent {
    SetSearch(String),
    SetSource(String),
    ToggleSeverity(Severity),
    SetSeverities(BTreeSet<Severity>),
    ClearFilters,
    FeedLoaded {
        seq: u64,
        batch: FeedBatch,
        at: DateTime<Utc>,
    },
    FeedFailed {
        seq: u64,
        error: String,
    },
    SetAutoRefresh(bool),
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    articles: Vec<Article>,
    sources: Vec<String>,
    successful_feeds: u32,
    filters: FilterCriteria,
    status: FeedStatus,
    last_updated: Option<DateTime<Utc>>,
    issued_seq: u64,
    applied_seq: u64,
    in_flight: usize,
    auto_refresh: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            articles: Vec::new(),
            sources: Vec::new(),
            successful_feeds: 0,
            filters: FilterCriteria::default(),
            status: FeedStatus::Idle,
            last_updated: None,
            issued_seq: 0,
            applied_seq: 0,
            in_flight: 0,
            auto_refresh: false,
        }
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new fetch and returns its sequence number.
    pub fn start_fetch(&mut self) -> u64 {
        self.issued_seq += 1;
        self.in_flight += 1;
        self.issued_seq
    }

    /// Applies an intent. Returns false when a feed result was discarded
    /// because a newer one had already been applied.
    pub fn apply(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::SetSearch(search) => self.filters.search = search,
            Intent::SetSource(source) => self.filters.source = source,
            Intent::ToggleSeverity(severity) => {
                if !self.filters.severities.remove(&severity) {
                    self.filters.severities.insert(severity);
                }
            }
            Intent::SetSeverities(severities) => self.filters.severities = severities,
            Intent::ClearFilters => self.filters = FilterCriteria::default(),
            Intent::FeedLoaded { seq, batch, at } => {
                self.finish_fetch();
                if seq <= self.applied_seq {
                    debug!(seq, applied = self.applied_seq, "discarding stale feed response");
                    return false;
                }
                self.applied_seq = seq;
                self.articles = ingest(batch.articles);
                self.sources = batch.sources;
                self.successful_feeds = batch.successful_feeds;
                self.status = FeedStatus::Live {
                    successful_feeds: batch.successful_feeds,
                    total_feeds: batch.total_feeds,
                };
                self.last_updated = Some(at);
            }
            Intent::FeedFailed { seq, error } => {
                self.finish_fetch();
                if seq <= self.applied_seq {
                    debug!(seq, applied = self.applied_seq, "discarding stale feed failure");
                    return false;
                }
                self.status = FeedStatus::Offline { error };
            }
            Intent::SetAutoRefresh(enabled) => self.auto_refresh = enabled,
        }
        true
    }

    fn finish_fetch(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn article(&self, id: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn filtered(&self, criteria: &FilterCriteria, now: DateTime<Utc>) -> Vec<ArticleView> {
        filter::filter(&self.articles, criteria)
            .into_iter()
            .map(|article| ArticleView::new(article, now))
            .collect()
    }

    pub fn timeline(&self, now: DateTime<Utc>) -> Vec<TimelineBucket> {
        timeline::aggregate(&self.articles, now)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> DashboardStats {
        let active_sources = if self.successful_feeds > 0 {
            self.successful_feeds
        } else {
            self.sources.len() as u32
        };
        DashboardStats::compute(&self.articles, active_sources, now)
    }

    pub fn view(&self, now: DateTime<Utc>) -> DashboardView {
        DashboardView {
            articles: self.filtered(&self.filters, now),
            total_articles: self.articles.len(),
            sources: self.sources.clone(),
            filters: self.filters.clone(),
            status: self.status.clone(),
            loading: self.is_loading(),
            last_updated: self.last_updated,
            auto_refresh: self.auto_refresh,
            stats: self.stats(now),
            timeline: self.timeline(now),
            generated_at: now,
        }
    }
}

/// Converts raw feed items, dropping the ones that cannot be read.
pub fn ingest(raw: Vec<RawArticle>) -> Vec<Article> {
    raw.into_iter()
        .filter_map(|item| match Article::from_raw(item) {
            Ok(article) => Some(article),
            Err(e) => {
                warn!("Skipping article: {}", e);
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: Article,
    pub display_age: String,
}

impl ArticleView {
    pub fn new(article: &Article, now: DateTime<Utc>) -> Self {
        Self {
            article: article.clone(),
            display_age: time_ago(article.published_at, now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub articles: Vec<ArticleView>,
    pub total_articles: usize,
    pub sources: Vec<String>,
    pub filters: FilterCriteria,
    pub status: FeedStatus,
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub auto_refresh: bool,
    pub stats: DashboardStats,
    pub timeline: Vec<TimelineBucket>,
    pub generated_at: DateTime<Utc>,
}

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// One day
pub const MAX_REFRESH_INTERVAL_MINUTES: u64 = 24 * 60;
/// One year
pub const MAX_SUMMARY_CACHE_HOURS: u64 = 24 * 365;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the feed/summary backend, e.g. `http://localhost:5001/api`
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Path of the feed endpoint under `api_base`
    #[serde(default = "default_feeds_path")]
    pub feeds_path: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Auto-refresh interval in minutes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    /// Start with auto-refresh enabled
    #[serde(default)]
    pub auto_refresh: bool,
    #[serde(default = "default_summary_cache_hours")]
    pub summary_cache_hours: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "http://localhost:5001/api".to_string()
}

fn default_feeds_path() -> String {
    "/feeds".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_summary_cache_hours() -> u64 {
    24
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            feeds_path: default_feeds_path(),
            bind_addr: default_bind_addr(),
            refresh_interval: default_refresh_interval(),
            auto_refresh: false,
            summary_cache_hours: default_summary_cache_hours(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_REFRESH_INTERVAL_MINUTES).contains(&self.refresh_interval) {
            anyhow::bail!(
                "refresh_interval must be between 1 and {} minutes",
                MAX_REFRESH_INTERVAL_MINUTES
            );
        }
        if !(1..=MAX_SUMMARY_CACHE_HOURS).contains(&self.summary_cache_hours) {
            anyhow::bail!(
                "summary_cache_hours must be between 1 and {}",
                MAX_SUMMARY_CACHE_HOURS
            );
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Auto-refresh period, clamped to the accepted range.
    pub fn refresh_period(&self) -> Duration {
        let minutes = self
            .refresh_interval
            .clamp(1, MAX_REFRESH_INTERVAL_MINUTES);
        Duration::from_secs(minutes * 60)
    }

    pub fn feeds_url(&self) -> String {
        join_url(&self.api_base, &self.feeds_path)
    }

    pub fn summarize_url(&self) -> String {
        join_url(&self.api_base, "/summarize")
    }

    pub fn daily_brief_url(&self) -> String {
        join_url(&self.api_base, "/daily-brief")
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

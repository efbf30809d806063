use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("upstream returned HTTP {0}")]
    Status(StatusCode),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("article not found: {0}")]
    NotFound(String),
}

impl DashboardError {
    /// Transport failures and non-2xx statuses both count as network failures.
    pub fn is_network(&self) -> bool {
        matches!(self, DashboardError::Network(_) | DashboardError::Status(_))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

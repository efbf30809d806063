use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::controller::DashboardController;
use crate::error::DashboardError;
use crate::filter::{parse_severity_list, FilterCriteria};
use crate::models::Severity;
use crate::state::{FeedStatus, Intent};

pub struct AppState {
    pub controller: Arc<DashboardController>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/dashboard", get(dashboard))
        .route("/api/filters", post(update_filters))
        .route("/api/articles", get(list_articles))
        .route("/api/articles/:id", get(article_detail))
        .route("/api/articles/:id/summary", post(article_summary))
        .route("/api/timeline", get(timeline))
        .route("/api/refresh", post(refresh))
        .route("/api/auto-refresh", post(auto_refresh))
        .route("/api/daily-brief", post(daily_brief))
        .route("/api/cache/stats", get(cache_stats))
        .route("/api/cache/clear", post(clear_cache))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

pub struct AppError(DashboardError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::Network(_)
            | DashboardError::Status(_)
            | DashboardError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        AppError(err)
    }
}

pub async fn health() -> impl IntoResponse {
    "OK"
}

pub async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.controller.view().await)
}

/// Partial filter update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct FilterUpdate {
    pub search: Option<String>,
    pub source: Option<String>,
    pub severities: Option<Vec<Severity>>,
    pub toggle_severity: Option<Severity>,
    #[serde(default)]
    pub clear: bool,
}

impl FilterUpdate {
    pub fn into_intents(self) -> Vec<Intent> {
        let mut intents = Vec::new();
        if self.clear {
            intents.push(Intent::ClearFilters);
        }
        if let Some(search) = self.search {
            intents.push(Intent::SetSearch(search));
        }
        if let Some(source) = self.source {
            intents.push(Intent::SetSource(source));
        }
        if let Some(severities) = self.severities {
            intents.push(Intent::SetSeverities(severities.into_iter().collect()));
        }
        if let Some(severity) = self.toggle_severity {
            intents.push(Intent::ToggleSeverity(severity));
        }
        intents
    }
}

pub async fn update_filters(
    State(state): State<Arc<AppState>>,
    Json(update): Json<FilterUpdate>,
) -> impl IntoResponse {
    Json(state.controller.dispatch_all(update.into_intents()).await)
}

#[derive(Debug, Deserialize)]
pub struct ArticleQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub source: String,
    /// Comma-separated, e.g. `critical,high`
    #[serde(default)]
    pub severity: String,
}

impl From<ArticleQuery> for FilterCriteria {
    fn from(query: ArticleQuery) -> Self {
        FilterCriteria {
            search: query.search,
            source: query.source,
            severities: parse_severity_list(&query.severity),
        }
    }
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticleQuery>,
) -> impl IntoResponse {
    let criteria = FilterCriteria::from(query);
    Json(state.controller.filtered(&criteria).await)
}

pub async fn article_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let article = state.controller.article(&id).await?;
    Ok(Json(article))
}

pub async fn article_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.controller.request_summary(&id).await?;
    Ok(Json(outcome))
}

pub async fn timeline(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.controller.view().await.timeline)
}

#[derive(Debug, Serialize)]
pub struct RefreshStatus {
    pub refreshing: bool,
    pub status: FeedStatus,
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Spawn the refresh task
    let controller = state.controller.clone();
    tokio::spawn(async move {
        let _ = controller.refresh().await;
    });

    let view = state.controller.view().await;
    Json(RefreshStatus {
        refreshing: true,
        status: view.status,
    })
}

#[derive(Debug, Deserialize)]
pub struct AutoRefreshRequest {
    pub enabled: bool,
}

pub async fn auto_refresh(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AutoRefreshRequest>,
) -> impl IntoResponse {
    state.controller.set_auto_refresh(request.enabled).await;
    Json(json!({ "auto_refresh": request.enabled }))
}

pub async fn daily_brief(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.controller.request_daily_brief().await?;
    Ok(Json(outcome))
}

pub async fn cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.controller.cache_stats().await)
}

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cleared = state.controller.clear_cache().await;
    Json(json!({
        "message": format!("Cleared {} cache entries", cleared),
        "cleared_count": cleared,
    }))
}

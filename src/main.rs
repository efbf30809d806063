use std::path::Path;
use std::sync::Arc;

use threatstream::config::Config;
use threatstream::controller::DashboardController;
use threatstream::routes::{self, AppState};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "threatstream=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("THREATSTREAM_CONFIG").unwrap_or_else(|_| "dashboard.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        Config::load(&config_path)?
    } else {
        info!("No config at {}, using defaults", config_path);
        Config::default()
    };
    info!("Using feed backend at {}", config.api_base);

    let controller = Arc::new(DashboardController::new(&config));

    // Do initial fetch
    info!("Starting initial feed fetch");
    if let Err(e) = controller.refresh().await {
        error!("Initial feed fetch failed: {}", e);
    }

    if config.auto_refresh {
        controller.set_auto_refresh(true).await;
    }

    let state = Arc::new(AppState {
        controller: controller.clone(),
    });
    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

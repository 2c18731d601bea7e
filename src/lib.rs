pub mod api;
pub mod auth;
pub mod captcha;
pub mod config;
pub mod content;
pub mod error;
pub mod render;
pub mod state;
pub mod storage;

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use config::Config;
use state::AppState;

pub async fn run() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("MYLOGS_LOG"))
        .init();

    let config = Config::from_env().expect("failed to load configuration");
    let app = AppState::new(config)
        .await
        .expect("failed to initialise data directory");

    if let Err(e) = api::run_server(app).await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

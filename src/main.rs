mod app;
mod clock;
mod config;
mod logs;
mod nutrition;
mod session;
mod state;
mod storage;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "carblog=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init()?;
    tracing::info!(
        data_dir = %state.config.data_dir.display(),
        timezone = %state.config.timezone,
        retention_days = state.config.retention_days,
        "log store ready"
    );

    let addr = state.config.bind_addr;
    app::serve(app::build_app(state), addr).await
}

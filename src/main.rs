use std::time::Duration;

use loca::{app, auth::session, config::AppConfig, seed, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "loca=debug,axum=info,tower_http=info".to_string());
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

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr()?;
    let app_state = AppState::init(config).await?;

    if app_state.config.seed_demo {
        if let Err(e) = seed::seed_demo(app_state.store.as_ref()).await {
            tracing::warn!(error = %e, "demo seed failed; continuing");
        }
    }

    session::spawn_sweeper(
        app_state.store.clone(),
        Duration::from_secs(app_state.config.session.sweep_minutes * 60),
    );

    app::serve(app::build_app(app_state), addr).await
}

//! Fake Job Detector: binary entrypoint
//! Boots the Axum HTTP server: settings, model, lexicon, routes.

use anyhow::Context;
use tracing::info;

use fake_job_detector::api::{self, AppState};
use fake_job_detector::config::Settings;
use fake_job_detector::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    telemetry::init_tracing();

    let settings = Settings::load().context("loading detector settings")?;
    let bind = settings.bind.clone();

    let state = AppState::from_settings(settings);
    state.watch_model();
    let router = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(%bind, "fake job detector listening");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}

//! Misinformation Verifier: binary entrypoint
//! Boots the Axum HTTP server: config, tracing, oracle, cache and routes.

use shuttle_axum::ShuttleAxum;

use misinfo_verifier::{logging, router, AppConfig, AppState};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // Picks up GEMINI_API_KEY, VERIFIER_CONFIG_PATH, RUST_LOG.
    let _ = dotenvy::dotenv();

    logging::init();

    let cfg = AppConfig::load().map_err(shuttle_runtime::Error::Custom)?;
    let state = AppState::from_config(&cfg).map_err(shuttle_runtime::Error::Custom)?;

    Ok(router(state).into())
}

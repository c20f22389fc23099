// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analyze;
pub mod api;
pub mod cache;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod oracle;
pub mod ratelimit;
pub mod service;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::model::{AnalysisResult, MediaAnalysis, Source, SourceReport, Status};
pub use crate::service::{CacheStatus, Verifier, VerifyError};

/// Build the full in-process app from `VERIFIER_CONFIG_PATH` (or defaults).
pub fn app() -> anyhow::Result<axum::Router> {
    let state = AppState::from_env()?;
    Ok(router(state))
}

//! Oracle abstraction: an external generative model that turns a prompt (and
//! optionally an inline image) into free text.
//!
//! The verifier only ever sees `Arc<dyn Oracle>`; production uses
//! `GeminiOracle`, local runs and tests use `DisabledOracle` or `StaticOracle`.

pub mod gemini;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::OracleConfig;

pub use gemini::GeminiOracle;

/// Base64 image payload sent alongside the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
}

impl OracleRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.image = Some(InlineImage {
            mime_type: mime_type.into(),
            data: data.into(),
        });
        self
    }
}

/// Coarse failure class used to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    ModelUnavailable,
    Generic,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    #[error("oracle API key is missing")]
    MissingApiKey,
    #[error("remote analysis is disabled")]
    Disabled,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),
    #[error("model {model} answered HTTP {status}: {body}")]
    Http {
        model: String,
        status: u16,
        body: String,
    },
    #[error("no model available (tried {})", attempted.join(", "))]
    Exhausted { attempted: Vec<String>, last_status: u16 },
    #[error("undecodable oracle response: {0}")]
    Decode(String),
}

impl OracleError {
    pub fn kind(&self) -> FailureKind {
        match self {
            OracleError::MissingApiKey | OracleError::Disabled => FailureKind::Configuration,
            OracleError::Http { status: 401 | 403, .. } => FailureKind::Configuration,
            OracleError::Http { status: 404, .. } => FailureKind::ModelUnavailable,
            OracleError::Exhausted { .. } => FailureKind::ModelUnavailable,
            _ => FailureKind::Generic,
        }
    }

    /// Last model tried, if the error knows it.
    pub fn suggested_model(&self) -> Option<&str> {
        match self {
            OracleError::Exhausted { attempted, .. } => attempted.last().map(String::as_str),
            OracleError::Http { model, .. } => Some(model.as_str()),
            _ => None,
        }
    }
}

/// Human-readable explanation of an oracle failure.
pub fn failure_message(err: &OracleError) -> String {
    match (err, err.kind()) {
        (OracleError::Disabled, _) => {
            "Remote analysis is disabled. Enable [oracle] in the verifier config.".to_string()
        }
        (_, FailureKind::Configuration) => {
            "Gemini API key is missing or invalid. Set GEMINI_API_KEY or update config/verifier.toml."
                .to_string()
        }
        (_, FailureKind::ModelUnavailable) => format!(
            "Gemini model not available for this API key. Enable access to {} in Google AI Studio or change the configured model.",
            err.suggested_model().unwrap_or(gemini::DEFAULT_FALLBACK_MODEL)
        ),
        (_, FailureKind::Generic) => format!("Remote analysis error: {err}"),
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, req: &OracleRequest) -> Result<String, OracleError>;

    /// Provider name for logs and diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynOracle = Arc<dyn Oracle>;

/// Always fails with `OracleError::Disabled`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOracle;

#[async_trait]
impl Oracle for DisabledOracle {
    async fn generate(&self, _req: &OracleRequest) -> Result<String, OracleError> {
        Err(OracleError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Canned reply or canned error. Records the last prompt it saw.
#[derive(Debug)]
pub struct StaticOracle {
    reply: Result<String, OracleError>,
    last: std::sync::Mutex<Option<OracleRequest>>,
}

impl StaticOracle {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            last: std::sync::Mutex::new(None),
        }
    }

    pub fn failing(err: OracleError) -> Self {
        Self {
            reply: Err(err),
            last: std::sync::Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<OracleRequest> {
        self.last.lock().ok().and_then(|g| g.clone())
    }
}

#[async_trait]
impl Oracle for StaticOracle {
    async fn generate(&self, req: &OracleRequest) -> Result<String, OracleError> {
        if let Ok(mut g) = self.last.lock() {
            *g = Some(req.clone());
        }
        self.reply.clone()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Build the oracle described by `cfg`.
///
/// * `VERIFIER_ORACLE=mock` returns a `StaticOracle` with an empty JSON reply.
/// * A disabled config returns `DisabledOracle`.
/// * Otherwise `GeminiOracle`. A client that cannot be built answers every call
///   with its construction error, so callers still see why analysis degraded.
pub fn build_oracle(cfg: &OracleConfig) -> DynOracle {
    if std::env::var("VERIFIER_ORACLE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(StaticOracle::replying("{}"));
    }

    if !cfg.enabled {
        return Arc::new(DisabledOracle);
    }

    match GeminiOracle::from_config(cfg) {
        Ok(o) => Arc::new(o),
        Err(e) => {
            tracing::warn!(error = %e, "gemini client unavailable");
            Arc::new(StaticOracle::failing(e))
        }
    }
}

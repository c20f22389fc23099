//! Google Gemini `generateContent` client with model fallback.
//!
//! Models are tried in configured order. 404 (model unknown) and 429 (quota)
//! move on to the next model; any other non-2xx aborts the whole call.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Oracle, OracleError, OracleRequest};
use crate::config::OracleConfig;

pub const DEFAULT_API_ROOT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-2.5-flash-lite";
pub const NO_RESPONSE: &str = "No response";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Inline {
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_else(|| NO_RESPONSE.to_string())
    }
}

pub struct GeminiOracle {
    http: reqwest::Client,
    api_key: String,
    api_root: String,
    models: Vec<String>,
    timeout: Duration,
}

impl GeminiOracle {
    pub fn from_config(cfg: &OracleConfig) -> Result<Self, OracleError> {
        if cfg.api_key.trim().is_empty() {
            return Err(OracleError::MissingApiKey);
        }
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let http = reqwest::Client::builder()
            .user_agent(concat!("misinfo-verifier/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: cfg.api_key.trim().to_string(),
            api_root: cfg.api_root.trim_end_matches('/').to_string(),
            models: cfg.models(),
            timeout,
        })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_root, model)
    }

    fn map_send_error(&self, e: reqwest::Error) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout(self.timeout)
        } else {
            // request URLs never reach error text
            OracleError::Transport(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn generate(&self, req: &OracleRequest) -> Result<String, OracleError> {
        let mut parts = vec![Part::Text { text: &req.prompt }];
        if let Some(img) = &req.image {
            parts.push(Part::Inline {
                inline_data: InlineData {
                    mime_type: &img.mime_type,
                    data: &img.data,
                },
            });
        }
        let body = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let mut attempted = Vec::with_capacity(self.models.len());
        let mut last_status = 0u16;

        for model in &self.models {
            attempted.push(model.clone());
            tracing::debug!(target: "oracle", %model, "gemini generateContent");

            let resp = self
                .http
                .post(self.endpoint(model))
                .header(API_KEY_HEADER, &self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| self.map_send_error(e))?;

            let status = resp.status();
            if status.is_success() {
                let raw = resp.text().await.map_err(|e| self.map_send_error(e))?;
                let parsed: GenerateResponse = serde_json::from_str(&raw)
                    .map_err(|e| OracleError::Decode(e.to_string()))?;
                return Ok(parsed.first_text());
            }

            match status.as_u16() {
                code @ (404 | 429) => {
                    tracing::warn!(target: "oracle", %model, status = code, "model unavailable, trying next");
                    last_status = code;
                    continue;
                }
                code => {
                    let mut text = resp.text().await.unwrap_or_default();
                    if text.len() > MAX_ERROR_BODY {
                        let cut = (0..=MAX_ERROR_BODY)
                            .rev()
                            .find(|i| text.is_char_boundary(*i))
                            .unwrap_or(0);
                        text.truncate(cut);
                    }
                    return Err(OracleError::Http {
                        model: model.clone(),
                        status: code,
                        body: text,
                    });
                }
            }
        }

        Err(OracleError::Exhausted {
            attempted,
            last_status,
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

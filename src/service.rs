//! Verification pipeline.
//!
//! Text: validate → hash → cache → oracle (or heuristic) → store.
//! Images and source URLs go straight to the oracle and are never cached.
//! Oracle failures never surface as errors; they become degraded results.

use std::time::Instant;

use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{info, warn};

use crate::analyze::heuristic::score_content;
use crate::analyze::keywords::extract_keywords;
use crate::analyze::normalize::{
    extract_json_object, normalize_analysis, parse_media_reply, parse_source_reply,
    OracleAnalysis, UNKNOWN,
};
use crate::analyze::scoring::{blend, BlendInputs};
use crate::cache::{content_hash, CacheRow, DynCache};
use crate::config::OracleConfig;
use crate::logging::anon_id;
use crate::metrics as m;
use crate::model::{
    AnalysisDetails, AnalysisResult, MediaAnalysis, SourceReport, Status,
    SERVICE_UNAVAILABLE_FLAG,
};
use crate::oracle::{failure_message, prompts, DynOracle, OracleError, OracleRequest};

pub const MAX_IMAGE_BASE64_LEN: usize = 10_000_000;
pub const ALLOWED_IMAGE_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
];
pub const FALLBACK_SUFFIX: &str = " (AI fallback active)";

/// Input rejected before any processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Content is required")]
    EmptyContent,
    #[error("Image data is required")]
    EmptyImage,
    #[error("Image is too large ({len} base64 characters, limit {MAX_IMAGE_BASE64_LEN})")]
    ImageTooLarge { len: usize },
    #[error("Unsupported image type: {0}")]
    UnsupportedMimeType(String),
    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextOutcome {
    pub result: AnalysisResult,
    pub cache: CacheStatus,
}

pub struct Verifier {
    oracle: DynOracle,
    cache: DynCache,
    config: OracleConfig,
}

impl Verifier {
    pub fn new(oracle: DynOracle, cache: DynCache, config: OracleConfig) -> Self {
        Self {
            oracle,
            cache,
            config,
        }
    }

    pub fn oracle_name(&self) -> &'static str {
        self.oracle.name()
    }

    pub async fn analyze_text(&self, content: &str) -> Result<TextOutcome, VerifyError> {
        if content.trim().is_empty() {
            return Err(VerifyError::EmptyContent);
        }
        let started = Instant::now();
        let id = anon_id(content);
        let hash = content_hash(content);

        match self.cache.latest(&hash).await {
            Ok(Some(row)) => {
                counter!(m::CACHE_HITS).increment(1);
                info!(target: "verifier", %id, cache = "hit", "text analysis");
                return Ok(TextOutcome {
                    result: row.to_result(),
                    cache: CacheStatus::Hit,
                });
            }
            Ok(None) => {}
            Err(e) => {
                counter!(m::CACHE_ERRORS).increment(1);
                warn!(target: "verifier", %id, error = %e, backend = self.cache.name(), "cache lookup failed");
            }
        }
        counter!(m::CACHE_MISSES).increment(1);

        let req = OracleRequest::text(prompts::fact_analysis(content));
        let (result, degraded) = match self.oracle.generate(&req).await.and_then(|reply| {
            extract_json_object(&reply)
                .ok_or_else(|| OracleError::Decode("no JSON object in reply".to_string()))
        }) {
            Ok(map) => {
                let outcome = normalize_analysis(&map);
                if !outcome.is_strict() {
                    tracing::debug!(target: "verifier", %id, "oracle reply needed coercion");
                }
                (from_oracle(content, outcome.into_inner()), false)
            }
            Err(OracleError::Disabled) => (score_content(content), false),
            Err(e) => {
                counter!(m::ORACLE_FAILURES).increment(1);
                warn!(target: "verifier", %id, oracle = self.oracle.name(), error = %e, "oracle failed");
                (self.degraded_text(content, &e), true)
            }
        };

        if !degraded && result.status != Status::Error {
            let row = CacheRow::from_result(content, &result);
            if let Err(e) = self.cache.insert(row).await {
                counter!(m::CACHE_ERRORS).increment(1);
                warn!(target: "verifier", %id, error = %e, backend = self.cache.name(), "cache write failed");
            }
        }

        let ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!(m::ANALYSIS_DURATION_MS, "kind" => "text").record(ms);
        counter!(m::ANALYSES, "kind" => "text").increment(1);
        info!(
            target: "verifier",
            %id,
            cache = "miss",
            score = result.trust_score,
            status = result.status.as_str(),
            flags = result.analysis.flags.len(),
            degraded,
            "text analysis"
        );

        Ok(TextOutcome {
            result,
            cache: CacheStatus::Miss,
        })
    }

    fn degraded_text(&self, content: &str, err: &OracleError) -> AnalysisResult {
        let hint = failure_message(err);
        if !self.config.heuristic_fallback {
            return AnalysisResult::error(hint, SERVICE_UNAVAILABLE_FLAG);
        }
        let mut r = score_content(content);
        r.analysis.flags.push(hint);
        r.message.push_str(FALLBACK_SUFFIX);
        r
    }

    pub async fn analyze_image(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<MediaAnalysis, VerifyError> {
        let (mime, data) = split_data_url(image_base64, mime_type);
        if data.is_empty() {
            return Err(VerifyError::EmptyImage);
        }
        if data.len() > MAX_IMAGE_BASE64_LEN {
            return Err(VerifyError::ImageTooLarge { len: data.len() });
        }
        if !ALLOWED_IMAGE_TYPES.contains(&mime.as_str()) {
            return Err(VerifyError::UnsupportedMimeType(mime));
        }

        let started = Instant::now();
        let req = OracleRequest::text(prompts::image_authenticity()).with_image(&mime, data);
        let out = match self.oracle.generate(&req).await {
            Ok(reply) => parse_media_reply(&reply),
            Err(e) => {
                counter!(m::ORACLE_FAILURES).increment(1);
                warn!(target: "verifier", %mime, error = %e, "image oracle failed");
                MediaAnalysis::error(failure_message(&e))
            }
        };

        histogram!(m::ANALYSIS_DURATION_MS, "kind" => "image")
            .record(started.elapsed().as_secs_f64() * 1000.0);
        counter!(m::ANALYSES, "kind" => "image").increment(1);
        info!(target: "verifier", %mime, bytes = data.len(), status = out.status.as_str(), "image analysis");
        Ok(out)
    }

    pub async fn analyze_source(&self, raw_url: &str) -> Result<SourceReport, VerifyError> {
        let raw_url = raw_url.trim();
        let parsed = url::Url::parse(raw_url)
            .map_err(|_| VerifyError::InvalidUrl(raw_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(VerifyError::InvalidUrl(raw_url.to_string()));
        }

        let started = Instant::now();
        let host = parsed.host_str().unwrap_or_default().to_string();
        let req = OracleRequest::text(prompts::source_credibility(parsed.as_str()));
        let report = match self.oracle.generate(&req).await {
            Ok(reply) => parse_source_reply(&reply),
            Err(e) => {
                counter!(m::ORACLE_FAILURES).increment(1);
                warn!(target: "verifier", %host, error = %e, "source oracle failed");
                SourceReport {
                    score: 0,
                    trust_signals: Vec::new(),
                    risks: vec![SERVICE_UNAVAILABLE_FLAG.to_string()],
                    summary: failure_message(&e),
                    recency: UNKNOWN.to_string(),
                    recommendations: Vec::new(),
                }
            }
        };

        histogram!(m::ANALYSIS_DURATION_MS, "kind" => "source")
            .record(started.elapsed().as_secs_f64() * 1000.0);
        counter!(m::ANALYSES, "kind" => "source").increment(1);
        info!(target: "verifier", %host, score = report.score, "source analysis");
        Ok(report)
    }
}

/// Build the final result from a normalized oracle reply.
fn from_oracle(content: &str, a: OracleAnalysis) -> AnalysisResult {
    let trust_score = blend(
        &BlendInputs {
            factual_accuracy: a.factual_accuracy,
            bias: a.bias,
            source_quality: a.source_quality,
            explicit: a.trust_score,
        },
        a.flags.len(),
        a.highlights.len(),
    );
    // `error` is reserved for failed analyses, which always score 0
    let status = match a.status {
        Some(Status::Error) | None => Status::from_score(trust_score),
        Some(known) => known,
    };
    let keywords = if a.keywords.is_empty() {
        extract_keywords(content)
    } else {
        a.keywords
    };

    AnalysisResult {
        trust_score,
        status,
        message: a.message,
        sources: a.sources,
        analysis: AnalysisDetails {
            factual_accuracy: a.factual_accuracy,
            bias: a.bias,
            source_quality: a.source_quality,
            flags: a.flags,
            highlights: a.highlights,
            keywords,
            checked_at: chrono::Utc::now(),
        },
    }
}

/// Split an optional `data:<mime>;base64,` prefix off the payload. An explicit
/// `mime_type` wins over the one in the prefix.
fn split_data_url<'a>(raw: &'a str, mime_type: &str) -> (String, &'a str) {
    let raw = raw.trim();
    let (prefix_mime, data) = match raw.strip_prefix("data:").and_then(|r| r.split_once(',')) {
        Some((meta, data)) => (meta.split(';').next().unwrap_or_default(), data),
        None => ("", raw),
    };
    let mime = if mime_type.trim().is_empty() {
        prefix_mime
    } else {
        mime_type
    };
    (mime.trim().to_ascii_lowercase(), data.trim())
}

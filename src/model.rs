//! Result shapes returned by every analysis path.
//!
//! `AnalysisResult` is the canonical text-analysis output; `MediaAnalysis` and
//! `SourceReport` are the image and source-credibility variants. All of them are
//! built once per request and serialized as camelCase JSON for the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trust tier shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Verified,
    Suspicious,
    False,
    Error,
}

impl Status {
    /// Tier for a heuristic or blended score (≥78 verified, ≥58 suspicious).
    pub fn from_score(score: u8) -> Self {
        if score >= VERIFIED_THRESHOLD {
            Status::Verified
        } else if score >= SUSPICIOUS_THRESHOLD {
            Status::Suspicious
        } else {
            Status::False
        }
    }

    /// Case-insensitive parse of an oracle-provided status label.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "verified" => Some(Status::Verified),
            "suspicious" => Some(Status::Suspicious),
            "false" => Some(Status::False),
            "error" => Some(Status::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Verified => "verified",
            Status::Suspicious => "suspicious",
            Status::False => "false",
            Status::Error => "error",
        }
    }
}

pub const VERIFIED_THRESHOLD: u8 = 78;
pub const SUSPICIOUS_THRESHOLD: u8 = 58;

/// One cited or inferred reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub credibility: u8,
    pub relevance: u8,
}

/// Sub-scores and signals behind a trust score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetails {
    pub factual_accuracy: u8,
    pub bias: u8,
    pub source_quality: u8,
    pub flags: Vec<String>,
    pub highlights: Vec<String>,
    pub keywords: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

/// Canonical text-analysis output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub trust_score: u8,
    pub status: Status,
    pub message: String,
    pub sources: Vec<Source>,
    pub analysis: AnalysisDetails,
}

impl AnalysisResult {
    /// Error-tier result: score 0, one flag, no sources.
    pub fn error(message: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            trust_score: 0,
            status: Status::Error,
            message: non_empty(message.into(), "Analysis failed. Please try again."),
            sources: Vec::new(),
            analysis: AnalysisDetails {
                factual_accuracy: 0,
                bias: 0,
                source_quality: 0,
                flags: vec![flag.into()],
                highlights: Vec::new(),
                keywords: Vec::new(),
                checked_at: Utc::now(),
            },
        }
    }
}

/// Per-aspect scores for image authenticity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub inconsistencies: u8,
    pub artifacts: u8,
    pub metadata: u8,
}

impl Default for TechnicalIndicators {
    fn default() -> Self {
        Self {
            inconsistencies: 50,
            artifacts: 50,
            metadata: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDetails {
    pub checked_at: DateTime<Utc>,
    pub keywords: Vec<String>,
}

/// Image authenticity output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAnalysis {
    pub is_original: bool,
    pub confidence: u8,
    pub message: String,
    pub flags: Vec<String>,
    pub highlights: Vec<String>,
    pub technical_indicators: TechnicalIndicators,
    pub status: Status,
    pub trust_score: u8,
    pub analysis: MediaDetails,
}

impl MediaAnalysis {
    /// Error-tier media result: not original, all indicators zeroed.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_original: false,
            confidence: 0,
            message: non_empty(message.into(), "Analysis failed."),
            flags: vec![SERVICE_UNAVAILABLE_FLAG.to_string()],
            highlights: Vec::new(),
            technical_indicators: TechnicalIndicators {
                inconsistencies: 0,
                artifacts: 0,
                metadata: 0,
            },
            status: Status::Error,
            trust_score: 0,
            analysis: MediaDetails {
                checked_at: Utc::now(),
                keywords: Vec::new(),
            },
        }
    }
}

/// Credibility report for a single online source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub score: u8,
    pub trust_signals: Vec<String>,
    pub risks: Vec<String>,
    pub summary: String,
    pub recency: String,
    pub recommendations: Vec<String>,
}

pub const SERVICE_UNAVAILABLE_FLAG: &str = "Analysis service unavailable";

fn non_empty(s: String, fallback: &str) -> String {
    if s.trim().is_empty() {
        fallback.to_string()
    } else {
        s
    }
}

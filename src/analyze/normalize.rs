//! Response normalizer for free-text oracle replies.
//!
//! The oracle is asked for JSON but answers in prose, fenced blocks, or with
//! the wrong field types. Parsing happens in two steps:
//!
//! 1. Locate a JSON object in the text (```json fence, bare fence, then the
//!    widest `{...}` span; the first candidate that parses wins).
//! 2. Try a strict typed parse of the expected shape. Only if that fails, run
//!    per-field coercion: numbers are clamped to 0–100, text is stringified,
//!    lists are flattened to non-empty strings, and every missing field gets a
//!    documented default.
//!
//! Nothing here returns an error; the worst case is an all-defaults value.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::sources::{clamp_score, host_label, PLACEHOLDER_NAME};
use crate::model::{
    MediaAnalysis, MediaDetails, Source, SourceReport, Status, TechnicalIndicators,
};

pub const DEFAULT_SCORE: u8 = 50;
pub const DEFAULT_MESSAGE: &str = "Analysis completed";
pub const DEFAULT_SOURCE_SCORE: u8 = 60;
pub const UNKNOWN: &str = "Unknown";
pub const NO_STRUCTURED_RESPONSE: &str = "No structured response";

/// Which parse path produced a value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// The input already had the exact expected shape.
    Strict(T),
    /// Field-by-field coercion was needed.
    Coerced(T),
}

impl<T> ParseOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            ParseOutcome::Strict(v) | ParseOutcome::Coerced(v) => v,
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, ParseOutcome::Strict(_))
    }
}

/* ----------------------------
JSON extraction
---------------------------- */

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("json fence regex"));
static FENCED_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("bare fence regex"));
static GREEDY_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("object regex"));

/// Find and parse the first JSON object embedded in `text`.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let candidates = [
        FENCED_JSON
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str()),
        FENCED_BARE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str()),
        GREEDY_OBJECT.find(text).map(|m| m.as_str()),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|raw| match serde_json::from_str::<Value>(raw.trim()) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
}

/* ----------------------------
Field coercion rules
---------------------------- */

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").expect("leading float regex")
});

/// Numbers and numeric-prefixed strings ("42", "87%") become rounded 0–100
/// scores; anything else yields `fallback`.
pub fn coerce_score(v: Option<&Value>, fallback: u8) -> u8 {
    let parsed = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => LEADING_FLOAT
            .find(s)
            .and_then(|m| m.as_str().trim().parse::<f64>().ok()),
        _ => None,
    };
    match parsed {
        Some(x) if x.is_finite() => clamp_score(x),
        _ => fallback,
    }
}

/// Same as `coerce_score` but keeps "absent" distinguishable.
pub fn coerce_optional_score(v: Option<&Value>) -> Option<u8> {
    const SENTINEL: u8 = u8::MAX;
    match coerce_score(v, SENTINEL) {
        SENTINEL => None,
        s => Some(s),
    }
}

/// Strings pass through, scalars are stringified, containers are serialized.
/// Null, missing and empty values yield `fallback`.
pub fn coerce_text(v: Option<&Value>, fallback: &str) -> String {
    let out = match v {
        None | Some(Value::Null) => return fallback.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => serde_json::to_string(other).unwrap_or_default(),
    };
    if out.is_empty() {
        fallback.to_string()
    } else {
        out
    }
}

/// Native booleans, or "true"/"false" in any case; otherwise `fallback`.
pub fn coerce_bool(v: Option<&Value>, fallback: bool) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => fallback,
        },
        _ => fallback,
    }
}

fn is_falsy(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

fn list_item_text(item: &Value) -> String {
    match item {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(inner) if inner.len() == 1 && inner[0].is_string() => {
            coerce_text(inner.first(), "").trim().to_string()
        }
        Value::Object(obj) if obj.get("text").is_some_and(Value::is_string) => {
            coerce_text(obj.get("text"), "").trim().to_string()
        }
        other => coerce_text(Some(other), ""),
    }
}

/// Scalars are wrapped into a one-element list; every element is stringified
/// and empty results are dropped.
pub fn coerce_list(v: Option<&Value>) -> Vec<String> {
    let Some(v) = v else {
        return Vec::new();
    };
    if is_falsy(v) {
        return Vec::new();
    }
    let items: Vec<&Value> = match v {
        Value::Array(arr) => arr.iter().collect(),
        scalar => vec![scalar],
    };
    items
        .into_iter()
        .map(list_item_text)
        .filter(|s| !s.is_empty())
        .collect()
}

fn coerce_source(item: &Value) -> Option<Source> {
    match item {
        Value::Object(obj) => {
            let url = coerce_text(obj.get("url"), "");
            let name_fallback = if url.is_empty() {
                PLACEHOLDER_NAME.to_string()
            } else {
                host_label(&url)
            };
            let name = coerce_text(obj.get("name").or_else(|| obj.get("title")), &name_fallback);
            Some(Source {
                name,
                url,
                credibility: coerce_score(obj.get("credibility"), DEFAULT_SCORE),
                relevance: coerce_score(obj.get("relevance"), DEFAULT_SCORE),
            })
        }
        Value::String(s) if !s.trim().is_empty() => {
            let s = s.trim();
            let is_link = s.starts_with("http://") || s.starts_with("https://");
            Some(Source {
                name: if is_link { host_label(s) } else { s.to_string() },
                url: if is_link { s.to_string() } else { String::new() },
                credibility: DEFAULT_SCORE,
                relevance: DEFAULT_SCORE,
            })
        }
        _ => None,
    }
}

/// Sources in any shape: list of objects, list of strings, or a bare value.
pub fn coerce_sources(v: Option<&Value>) -> Vec<Source> {
    let Some(v) = v else {
        return Vec::new();
    };
    let items: Vec<&Value> = match v {
        Value::Array(arr) => arr.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    };
    items.into_iter().filter_map(coerce_source).collect()
}

fn strict<T: DeserializeOwned>(map: &Map<String, Value>) -> Option<T> {
    serde_json::from_value(Value::Object(map.clone())).ok()
}

fn clean_list(items: &[String]) -> bool {
    items.iter().all(|s| !s.is_empty())
}

/* ----------------------------
Text fact analysis
---------------------------- */

/// Normalized fact-analysis reply from the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleAnalysis {
    pub factual_accuracy: u8,
    pub bias: u8,
    pub source_quality: u8,
    /// Explicit score, if the oracle gave one; the blender uses it as base.
    pub trust_score: Option<u8>,
    /// Known status tier, if the oracle gave a recognizable one.
    pub status: Option<Status>,
    pub message: String,
    pub flags: Vec<String>,
    pub highlights: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub sources: Vec<Source>,
}

impl OracleAnalysis {
    /// All-defaults value carrying `message`.
    pub fn defaults(message: &str) -> Self {
        Self {
            factual_accuracy: DEFAULT_SCORE,
            bias: DEFAULT_SCORE,
            source_quality: DEFAULT_SCORE,
            trust_score: None,
            status: None,
            message: if message.is_empty() {
                DEFAULT_MESSAGE.to_string()
            } else {
                message.to_string()
            },
            flags: Vec::new(),
            highlights: Vec::new(),
            keywords: Vec::new(),
            sources: Vec::new(),
        }
    }

    fn is_well_formed(&self) -> bool {
        let in_range = |x: u8| x <= 100;
        in_range(self.factual_accuracy)
            && in_range(self.bias)
            && in_range(self.source_quality)
            && self.trust_score.map_or(true, in_range)
            && !self.message.is_empty()
            && clean_list(&self.flags)
            && clean_list(&self.highlights)
            && clean_list(&self.keywords)
            && self.sources.iter().all(|s| {
                !s.name.is_empty() && in_range(s.credibility) && in_range(s.relevance)
            })
    }

    fn coerce(map: &Map<String, Value>) -> Self {
        Self {
            factual_accuracy: coerce_score(map.get("factualAccuracy"), DEFAULT_SCORE),
            bias: coerce_score(map.get("bias"), DEFAULT_SCORE),
            source_quality: coerce_score(map.get("sourceQuality"), DEFAULT_SCORE),
            trust_score: coerce_optional_score(map.get("trustScore")),
            status: map
                .get("status")
                .and_then(Value::as_str)
                .and_then(Status::parse),
            message: coerce_text(map.get("message"), DEFAULT_MESSAGE),
            flags: coerce_list(map.get("flags")),
            highlights: coerce_list(map.get("highlights")),
            keywords: coerce_list(map.get("keywords")),
            sources: coerce_sources(map.get("sources")),
        }
    }

    fn finish(mut self) -> Self {
        // Stable: equal relevance keeps oracle order.
        self.sources.sort_by(|a, b| b.relevance.cmp(&a.relevance));
        self
    }
}

/// Normalize a parsed JSON object into an `OracleAnalysis`.
pub fn normalize_analysis(map: &Map<String, Value>) -> ParseOutcome<OracleAnalysis> {
    match strict::<OracleAnalysis>(map).filter(OracleAnalysis::is_well_formed) {
        Some(v) => ParseOutcome::Strict(v.finish()),
        None => ParseOutcome::Coerced(OracleAnalysis::coerce(map).finish()),
    }
}

/// Full path from raw reply text to a normalized analysis.
pub fn parse_analysis_reply(text: &str) -> OracleAnalysis {
    match extract_json_object(text) {
        Some(map) => normalize_analysis(&map).into_inner(),
        None => {
            tracing::debug!(len = text.len(), "no JSON object in oracle reply");
            OracleAnalysis::defaults(text.trim())
        }
    }
}

/* ----------------------------
Image authenticity
---------------------------- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrictMediaReply {
    is_original: bool,
    confidence: u8,
    message: String,
    flags: Vec<String>,
    highlights: Vec<String>,
    technical_indicators: TechnicalIndicators,
    #[serde(default)]
    keywords: Vec<String>,
}

impl StrictMediaReply {
    fn is_well_formed(&self) -> bool {
        let t = &self.technical_indicators;
        self.confidence <= 100
            && t.inconsistencies <= 100
            && t.artifacts <= 100
            && t.metadata <= 100
            && !self.message.is_empty()
            && clean_list(&self.flags)
            && clean_list(&self.highlights)
            && clean_list(&self.keywords)
    }
}

fn media_from_parts(
    is_original: bool,
    confidence: u8,
    message: String,
    flags: Vec<String>,
    highlights: Vec<String>,
    technical_indicators: TechnicalIndicators,
    keywords: Vec<String>,
) -> MediaAnalysis {
    MediaAnalysis {
        is_original,
        confidence,
        message,
        flags,
        highlights,
        technical_indicators,
        status: if is_original {
            Status::Verified
        } else {
            Status::False
        },
        trust_score: confidence,
        analysis: MediaDetails {
            checked_at: Utc::now(),
            keywords,
        },
    }
}

/// Normalize an image-authenticity object. `fallback_message` is used when the
/// object has no message (typically the raw reply text).
pub fn normalize_media(
    map: &Map<String, Value>,
    fallback_message: &str,
) -> ParseOutcome<MediaAnalysis> {
    if let Some(s) = strict::<StrictMediaReply>(map).filter(StrictMediaReply::is_well_formed) {
        return ParseOutcome::Strict(media_from_parts(
            s.is_original,
            s.confidence,
            s.message,
            s.flags,
            s.highlights,
            s.technical_indicators,
            s.keywords,
        ));
    }

    let defaults = TechnicalIndicators::default();
    let ti = map.get("technicalIndicators").and_then(Value::as_object);
    let indicator = |key: &str, fallback: u8| coerce_score(ti.and_then(|t| t.get(key)), fallback);
    let technical_indicators = TechnicalIndicators {
        inconsistencies: indicator("inconsistencies", defaults.inconsistencies),
        artifacts: indicator("artifacts", defaults.artifacts),
        metadata: indicator("metadata", defaults.metadata),
    };

    let keywords = match map.get("keywords") {
        Some(v) => coerce_list(Some(v)),
        None => coerce_list(
            map.get("analysis")
                .and_then(Value::as_object)
                .and_then(|a| a.get("keywords")),
        ),
    };

    let message_fallback = if fallback_message.is_empty() {
        DEFAULT_MESSAGE
    } else {
        fallback_message
    };
    let message = match map.get("message") {
        None | Some(Value::Null) => message_fallback.to_string(),
        v => coerce_text(v, DEFAULT_MESSAGE),
    };

    ParseOutcome::Coerced(media_from_parts(
        coerce_bool(map.get("isOriginal"), true),
        coerce_score(map.get("confidence"), DEFAULT_SCORE),
        message,
        coerce_list(map.get("flags")),
        coerce_list(map.get("highlights")),
        technical_indicators,
        keywords,
    ))
}

pub fn parse_media_reply(text: &str) -> MediaAnalysis {
    let map = extract_json_object(text).unwrap_or_default();
    normalize_media(&map, text.trim()).into_inner()
}

/* ----------------------------
Source credibility
---------------------------- */

impl SourceReport {
    fn is_well_formed(&self) -> bool {
        self.score <= 100
            && !self.summary.is_empty()
            && !self.recency.is_empty()
            && clean_list(&self.trust_signals)
            && clean_list(&self.risks)
            && clean_list(&self.recommendations)
    }

    /// Report used when the reply holds no JSON at all.
    pub fn unstructured(raw: &str) -> Self {
        Self {
            score: DEFAULT_SOURCE_SCORE,
            trust_signals: vec![NO_STRUCTURED_RESPONSE.to_string()],
            risks: Vec::new(),
            summary: if raw.is_empty() {
                UNKNOWN.to_string()
            } else {
                raw.to_string()
            },
            recency: UNKNOWN.to_string(),
            recommendations: Vec::new(),
        }
    }
}

pub fn normalize_source_report(map: &Map<String, Value>) -> ParseOutcome<SourceReport> {
    if let Some(r) = strict::<SourceReport>(map).filter(SourceReport::is_well_formed) {
        return ParseOutcome::Strict(r);
    }
    ParseOutcome::Coerced(SourceReport {
        score: coerce_score(map.get("score"), DEFAULT_SOURCE_SCORE),
        trust_signals: coerce_list(map.get("trustSignals")),
        risks: coerce_list(map.get("risks")),
        summary: coerce_text(map.get("summary"), UNKNOWN),
        recency: coerce_text(map.get("recency"), UNKNOWN),
        recommendations: coerce_list(map.get("recommendations")),
    })
}

pub fn parse_source_reply(text: &str) -> SourceReport {
    match extract_json_object(text) {
        Some(map) => normalize_source_report(&map).into_inner(),
        None => SourceReport::unstructured(text.trim()),
    }
}

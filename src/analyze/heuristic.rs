//! Heuristic credibility scorer.
//!
//! Applies the pattern library to raw content and accumulates fixed penalties
//! onto a baseline trust score. Each triggered category adds exactly one flag.
//! No I/O; any string (including an empty one) produces a complete result.

use chrono::Utc;

use super::keywords::extract_keywords;
use super::patterns::{
    caps_runs, distinct_urgency_terms, references_sources, BIAS_MARKERS, HEALTH_MISINFO,
    POLITICAL_MISINFO, SENSATIONAL,
};
use super::sources::{clamp_score, extract_sources};
use crate::model::{AnalysisDetails, AnalysisResult, Status};

pub const BASELINE: i32 = 82;

pub const SENSATIONAL_PENALTY: i32 = 8;
pub const HEALTH_PENALTY: i32 = 10;
pub const POLITICAL_PENALTY: i32 = 10;
pub const URGENCY_PENALTY: i32 = 6;
pub const NO_SOURCES_PENALTY: i32 = 8;
pub const CAPS_PENALTY: i32 = 5;
pub const BIAS_PENALTY: i32 = 5;

const URGENCY_MIN_TERMS: usize = 2;
const CAPS_MIN_RUNS: usize = 4;
const BIAS_MAX_MARKERS: usize = 2;

pub const FLAG_SENSATIONAL: &str = "Sensational language detected";
pub const FLAG_HEALTH: &str = "Potential health misinformation cues";
pub const FLAG_POLITICAL: &str = "Possible political misinformation";
pub const FLAG_URGENCY: &str = "High urgency language detected";
pub const FLAG_NO_SOURCES: &str = "No explicit sources referenced";
pub const FLAG_CAPS: &str = "Consistent emphasis (all-caps) detected";
pub const FLAG_BIAS: &str = "Potential bias reinforcing language";

pub const HIGHLIGHT_REFERENCES: &str = "External references detected";
pub const HIGHLIGHT_CITATIONS: &str = "Citations included for verification";

/// Raw signal counts gathered from one pass over the content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub sensational: usize,
    pub health: usize,
    pub political: usize,
    pub urgency_terms: usize,
    pub has_references: bool,
    pub caps_runs: usize,
    pub bias_markers: usize,
}

impl Signals {
    pub fn collect(content: &str) -> Self {
        Self {
            sensational: SENSATIONAL.count_matches(content),
            health: HEALTH_MISINFO.count_matches(content),
            political: POLITICAL_MISINFO.count_matches(content),
            urgency_terms: distinct_urgency_terms(content),
            has_references: references_sources(content),
            caps_runs: caps_runs(content),
            bias_markers: BIAS_MARKERS.count_matches(content),
        }
    }

    /// Apply penalties to the baseline; returns (unclamped score, flags).
    pub fn penalize(&self) -> (i32, Vec<String>) {
        let mut score = BASELINE;
        let mut flags = Vec::new();

        let mut hit = |triggered: bool, penalty: i32, flag: &str| {
            if triggered {
                score -= penalty;
                flags.push(flag.to_string());
            }
        };

        hit(
            self.sensational > 0,
            SENSATIONAL_PENALTY * self.sensational as i32,
            FLAG_SENSATIONAL,
        );
        hit(
            self.health > 0,
            HEALTH_PENALTY * self.health as i32,
            FLAG_HEALTH,
        );
        hit(
            self.political > 0,
            POLITICAL_PENALTY * self.political as i32,
            FLAG_POLITICAL,
        );
        hit(
            self.urgency_terms >= URGENCY_MIN_TERMS,
            URGENCY_PENALTY,
            FLAG_URGENCY,
        );
        hit(!self.has_references, NO_SOURCES_PENALTY, FLAG_NO_SOURCES);
        hit(self.caps_runs >= CAPS_MIN_RUNS, CAPS_PENALTY, FLAG_CAPS);
        hit(
            self.bias_markers > BIAS_MAX_MARKERS,
            BIAS_PENALTY,
            FLAG_BIAS,
        );

        (score, flags)
    }
}

/// Message template per status tier.
pub fn tier_message(status: Status) -> &'static str {
    match status {
        Status::Verified => "Heuristic analysis indicates credible language patterns.",
        Status::Suspicious => "Mixed indicators present; manually confirm with cited sources.",
        Status::False => "Multiple high-risk signals detected. Treat this content with caution.",
        Status::Error => "Analysis failed. Please try again.",
    }
}

/// Score `content` without any external help.
pub fn score_content(content: &str) -> AnalysisResult {
    let signals = Signals::collect(content);
    let (raw_score, flags) = signals.penalize();

    let mut highlights = Vec::new();
    if signals.has_references {
        highlights.push(HIGHLIGHT_REFERENCES.to_string());
    }

    let sources = extract_sources(content);
    if !sources.is_empty() {
        highlights.push(HIGHLIGHT_CITATIONS.to_string());
    }

    let keywords = extract_keywords(content);
    if !keywords.is_empty() {
        let top: Vec<&str> = keywords.iter().take(3).map(String::as_str).collect();
        highlights.push(format!("Key topics identified: {}", top.join(", ")));
    }

    let source_bonus = if sources.is_empty() { -5 } else { 5 };
    let factual_accuracy = clamp_score(f64::from(raw_score + source_bonus));

    let bias_raw =
        100 - 12 * signals.bias_markers as i32 + if signals.has_references { 5 } else { 0 };
    let bias = clamp_score(f64::from(bias_raw));

    let source_quality = if sources.is_empty() {
        clamp_score(f64::from(45 - 2 * flags.len() as i32))
    } else {
        clamp_score(f64::from(65 + 5 * sources.len() as i32))
    };

    let trust_score = clamp_score(f64::from(raw_score));
    let status = Status::from_score(trust_score);

    AnalysisResult {
        trust_score,
        status,
        message: tier_message(status).to_string(),
        sources,
        analysis: AnalysisDetails {
            factual_accuracy,
            bias,
            source_quality,
            flags,
            highlights,
            keywords,
            checked_at: Utc::now(),
        },
    }
}

//! Pattern library for the heuristic scorer.
//!
//! Fixed regex tables grouped by category. Matching is case-insensitive and
//! substring based; there is no stemming or tokenization beyond the regexes.

use once_cell::sync::Lazy;
use regex::Regex;

/// A compiled category table.
#[derive(Debug)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    fn compile(raw: &[&str]) -> Self {
        let patterns = raw
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("static pattern regex"))
            .collect();
        Self { patterns }
    }

    /// Number of distinct patterns in the table that match `text`.
    pub fn count_matches(&self, text: &str) -> usize {
        self.patterns.iter().filter(|re| re.is_match(text)).count()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

pub static SENSATIONAL: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::compile(&[
        r"100%\s+(success|cure|effective|guaranteed)",
        r"doctors\s+hate\s+this",
        r"miracle\s+cure",
        r"big\s+pharma",
        r"government\s+cover.?up",
        r"they\s+don'?t\s+want\s+you\s+to\s+know",
        r"shocking\s+revelation",
        r"breaking.*immediately",
        r"urgent.*share",
        r"forward\s+to\s+everyone",
    ])
});

pub static HEALTH_MISINFO: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::compile(&[
        r"cure.*cancer",
        r"lose.*weight.*overnight",
        r"never\s+see\s+(a\s+)?doctor\s+again",
        r"natural\s+remedy.*everything",
    ])
});

pub static POLITICAL_MISINFO: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::compile(&[
        r"new\s+tax.*50%",
        r"government\s+announces.*immediately",
        r"martial\s+law",
        r"election.*rigged",
    ])
});

pub static BIAS_MARKERS: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::compile(&[
        r"always",
        r"never",
        r"everyone",
        r"no\s+one",
        r"clearly",
        r"obviously",
        r"undeniably",
    ])
});

/// Closed urgency vocabulary; matched as lower-case substrings.
pub const URGENCY_TERMS: [&str; 5] = ["urgent", "immediately", "breaking", "emergency", "alert"];

/// Number of distinct urgency terms present in `text`.
pub fn distinct_urgency_terms(text: &str) -> usize {
    let lower = text.to_lowercase();
    URGENCY_TERMS
        .iter()
        .filter(|term| lower.contains(*term))
        .count()
}

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://").expect("url regex"));
static ACCORDING_TO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)according\s+to").expect("according-to regex"));
static CAPS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{3,}").expect("caps regex"));

/// True if the text links anywhere or attributes a claim ("according to").
pub fn references_sources(text: &str) -> bool {
    URL_RE.is_match(text) || ACCORDING_TO_RE.is_match(text)
}

/// Number of runs of three or more ASCII capitals.
pub fn caps_runs(text: &str) -> usize {
    CAPS_RUN_RE.find_iter(text).count()
}

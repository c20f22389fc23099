//! Source extraction: URLs found in the content become `Source` entries with
//! synthetic credibility/relevance scores.
//!
//! Scores are drawn from a small LCG seeded by a rolling hash of the whole
//! content, so identical content always yields identical sources.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::model::Source;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://[^\s)\]]+").expect("url extraction regex"));

const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

pub const PLACEHOLDER_NAME: &str = "Referenced Source";

/// Rolling 32-bit hash over UTF-16 code units: `hash = hash * 31 + unit`.
pub fn content_seed(content: &str) -> u32 {
    content
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// Linear congruential generator (Numerical Recipes constants), modulus 2^32.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    /// A zero seed is replaced with 1.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Next value in [0, 1).
    pub fn next_unit(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        f64::from(self.state) / 4_294_967_296.0
    }
}

/// Unique `http(s)://` URLs in first-seen order, trailing punctuation trimmed.
pub fn extract_urls(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for m in URL_RE.find_iter(content) {
        let url = m.as_str().trim_end_matches(TRAILING_PUNCT);
        if url.is_empty() {
            continue;
        }
        if seen.insert(url.to_string()) {
            out.push(url.to_string());
        }
    }
    out
}

/// Display name for a URL: host without a leading `www.`, or the raw string if
/// the URL does not parse.
pub fn host_label(raw: &str) -> String {
    let name = match url::Url::parse(raw) {
        Ok(u) => u
            .host_str()
            .map(|h| h.strip_prefix("www.").unwrap_or(h).to_string())
            .unwrap_or_default(),
        Err(_) => raw.to_string(),
    };
    if name.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        name
    }
}

/// Resolve every URL in `content` to a `Source`.
///
/// Credibility lands in 60–95 and relevance in 50–95; both draws happen per URL
/// in that order, so the sequence depends only on the content.
pub fn extract_sources(content: &str) -> Vec<Source> {
    let urls = extract_urls(content);
    if urls.is_empty() {
        return Vec::new();
    }

    let mut rng = Lcg::new(content_seed(content));
    urls.into_iter()
        .map(|url| {
            let credibility = 60.0 + rng.next_unit() * 35.0;
            let relevance = 50.0 + rng.next_unit() * 45.0;
            Source {
                name: host_label(&url),
                url,
                credibility: clamp_score(credibility),
                relevance: clamp_score(relevance),
            }
        })
        .collect()
}

/// Round and clamp to [0, 100].
pub(crate) fn clamp_score(x: f64) -> u8 {
    if !x.is_finite() {
        return 0;
    }
    x.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_matches_reference_vectors() {
        assert_eq!(content_seed(""), 0);
        assert_eq!(content_seed("a"), 97);
        assert_eq!(
            content_seed("Report available at https://example.org/report"),
            100_405_500
        );
    }

    #[test]
    fn lcg_first_draw_matches_reference() {
        let mut rng = Lcg::new(97);
        let r = rng.next_unit();
        assert!((r - 0.273_660_558_275_878_43).abs() < 1e-12, "got {r}");
    }

    #[test]
    fn zero_seed_behaves_like_one() {
        let mut a = Lcg::new(0);
        let mut b = Lcg::new(1);
        assert_eq!(a.next_unit(), b.next_unit());
    }

    #[test]
    fn urls_are_unique_ordered_and_trimmed() {
        let urls = extract_urls(
            "See https://b.org/x, then http://a.com. Again https://b.org/x and (https://c.net/y)",
        );
        assert_eq!(urls, vec!["https://b.org/x", "http://a.com", "https://c.net/y"]);
    }

    #[test]
    fn host_label_strips_www() {
        assert_eq!(host_label("https://www.who.int/news"), "who.int");
        assert_eq!(host_label("https://example.org/report"), "example.org");
    }

    #[test]
    fn sources_use_seeded_scores() {
        let text = "Report available at https://example.org/report";
        let s = extract_sources(text);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].name, "example.org");
        assert_eq!(s[0].url, "https://example.org/report");
        assert_eq!(s[0].credibility, 82);
        assert_eq!(s[0].relevance, 58);
        assert_eq!(extract_sources(text), s);
    }

    #[test]
    fn no_urls_no_sources() {
        assert!(extract_sources("no links here").is_empty());
        assert!(extract_sources("").is_empty());
    }
}

//! Keyword extraction: significant lower-case terms in first-seen order.

use std::collections::HashSet;

pub const MAX_KEYWORDS: usize = 6;
const MIN_LEN_EXCLUSIVE: usize = 5;

/// Long function words and URL fragments that carry no topic.
const STOP_WORDS: &[&str] = &[
    "about", "according", "actually", "after", "against", "again", "almost", "already", "although",
    "always", "another", "anything", "around", "because", "before", "behind", "between", "cannot",
    "during", "either", "enough", "everyone", "everything", "further", "however", "itself",
    "nothing", "others", "perhaps", "rather", "really", "should", "something", "through", "toward",
    "towards", "whether", "within", "without", "would", "could", "https", "http",
];

/// Alphanumeric tokens, lower-case.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_stop_word(tok: &str) -> bool {
    STOP_WORDS.contains(&tok)
}

/// Up to six unique tokens longer than five characters, skipping stop words.
pub fn extract_keywords(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(content)
        .filter(|t| t.chars().count() > MIN_LEN_EXCLUSIVE && !is_stop_word(t))
        .filter(|t| seen.insert(t.clone()))
        .take(MAX_KEYWORDS)
        .collect()
}

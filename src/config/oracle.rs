// src/config/oracle.rs
use serde::{Deserialize, Serialize};
use std::env;

use crate::oracle::gemini::{DEFAULT_API_ROOT, DEFAULT_FALLBACK_MODEL, DEFAULT_MODEL};

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_true() -> bool {
    true
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_fallback_models() -> Vec<String> {
    vec![DEFAULT_FALLBACK_MODEL.to_string()]
}
fn default_api_root() -> String {
    DEFAULT_API_ROOT.to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// `[oracle]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub enabled: bool,
    /// "ENV" (or empty) means: read from GEMINI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,
    #[serde(default = "default_api_root")]
    pub api_root: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// On oracle failure, answer text requests with the heuristic scorer.
    #[serde(default = "default_true")]
    pub heuristic_fallback: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: default_api_key(),
            model: default_model(),
            fallback_models: default_fallback_models(),
            api_root: default_api_root(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            heuristic_fallback: true,
        }
    }
}

impl OracleConfig {
    /// Resolve the key and repair values that would make the client unusable.
    pub fn sanitize(&mut self) {
        let key = self.api_key.trim();
        if key.is_empty() || key.eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_GEMINI_API_KEY).unwrap_or_default();
        }

        if self.timeout_secs == 0 {
            self.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        if self.model.trim().is_empty() {
            self.model = default_model();
        }
        if self.api_root.trim().is_empty() {
            self.api_root = default_api_root();
        }
    }

    /// Primary model followed by fallbacks, blanks and duplicates removed.
    pub fn models(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(1 + self.fallback_models.len());
        for m in std::iter::once(&self.model).chain(self.fallback_models.iter()) {
            let m = m.trim();
            if !m.is_empty() && !out.iter().any(|x| x == m) {
                out.push(m.to_string());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn models_are_deduplicated_in_order() {
        let c = OracleConfig {
            model: "a".into(),
            fallback_models: vec!["b".into(), "a".into(), " ".into(), "c".into(), "b".into()],
            ..OracleConfig::default()
        };
        assert_eq!(c.models(), vec!["a", "b", "c"]);
    }

    #[test]
    #[serial]
    fn env_key_is_resolved() {
        env::set_var(ENV_GEMINI_API_KEY, "from-env");
        let mut c = OracleConfig::default();
        c.sanitize();
        assert_eq!(c.api_key, "from-env");
        env::remove_var(ENV_GEMINI_API_KEY);

        let mut literal = OracleConfig {
            api_key: "literal".into(),
            ..OracleConfig::default()
        };
        literal.sanitize();
        assert_eq!(literal.api_key, "literal");
    }

    #[test]
    #[serial]
    fn zero_timeout_resets() {
        let mut c = OracleConfig {
            timeout_secs: 0,
            model: "".into(),
            ..OracleConfig::default()
        };
        c.sanitize();
        assert_eq!(c.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(c.model, DEFAULT_MODEL);
    }
}

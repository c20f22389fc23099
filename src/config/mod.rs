// src/config/mod.rs
//! Service configuration loaded from TOML.
//!
//! Path comes from `VERIFIER_CONFIG_PATH` (default `config/verifier.toml`).
//! A missing file means defaults; a malformed one is an error.

pub mod oracle;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use oracle::OracleConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/verifier.toml";
pub const ENV_CONFIG_PATH: &str = "VERIFIER_CONFIG_PATH";
pub const DEFAULT_JSONL_PATH: &str = "data/analysis_cache.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Jsonl,
}

fn default_jsonl_path() -> PathBuf {
    PathBuf::from(DEFAULT_JSONL_PATH)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    /// Only used by the jsonl backend.
    #[serde(default = "default_jsonl_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            path: default_jsonl_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
}

pub const DEFAULT_TEXT_PER_MINUTE: u32 = 20;
pub const DEFAULT_IMAGE_PER_MINUTE: u32 = 10;

fn default_true() -> bool {
    true
}

fn default_text_per_minute() -> u32 {
    DEFAULT_TEXT_PER_MINUTE
}

fn default_image_per_minute() -> u32 {
    DEFAULT_IMAGE_PER_MINUTE
}

/// Per-client request budget for the `/api/analyze*` routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Text and source analyses.
    #[serde(default = "default_text_per_minute")]
    pub per_minute: u32,
    #[serde(default = "default_image_per_minute")]
    pub image_per_minute: u32,
    /// Bucket capacity; 0 means "same as the per-minute rate".
    #[serde(default)]
    pub burst: u32,
    /// Key clients by `X-Forwarded-For` / `X-Real-IP`. Only safe behind a proxy
    /// that overwrites those headers.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_minute: DEFAULT_TEXT_PER_MINUTE,
            image_per_minute: DEFAULT_IMAGE_PER_MINUTE,
            burst: 0,
            trust_forwarded_for: false,
        }
    }
}

impl RateLimitConfig {
    /// A zero rate would lock every client out; treat it as the default.
    pub fn sanitize(&mut self) {
        if self.per_minute == 0 {
            self.per_minute = DEFAULT_TEXT_PER_MINUTE;
        }
        if self.image_per_minute == 0 {
            self.image_per_minute = DEFAULT_IMAGE_PER_MINUTE;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load from `VERIFIER_CONFIG_PATH` or the default path.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_file(path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file; using defaults");
            let mut cfg = Self::default();
            cfg.oracle.sanitize();
            cfg.rate_limit.sanitize();
            return Ok(cfg);
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::from_toml_str(&data)
            .with_context(|| format!("invalid config at {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;
        cfg.oracle.sanitize();
        cfg.rate_limit.sanitize();
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn parses_full_file() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [oracle]
            enabled = true
            api_key = "k"
            model = "gemini-x"
            fallback_models = ["gemini-y"]
            timeout_secs = 12
            heuristic_fallback = false

            [cache]
            backend = "jsonl"
            path = "/tmp/c.jsonl"

            [metrics]
            enabled = true
            "#,
        )
        .unwrap();
        assert!(cfg.oracle.enabled);
        assert_eq!(cfg.oracle.api_key, "k");
        assert_eq!(cfg.oracle.models(), vec!["gemini-x", "gemini-y"]);
        assert_eq!(cfg.oracle.timeout_secs, 12);
        assert!(!cfg.oracle.heuristic_fallback);
        assert_eq!(cfg.cache.backend, CacheBackend::Jsonl);
        assert_eq!(cfg.cache.path, PathBuf::from("/tmp/c.jsonl"));
        assert!(cfg.metrics.enabled);
    }

    #[test]
    #[serial]
    fn empty_file_is_all_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert!(!cfg.oracle.enabled);
        assert_eq!(cfg.cache.backend, CacheBackend::Memory);
        assert!(!cfg.metrics.enabled);
        assert!(cfg.oracle.heuristic_fallback);
    }

    #[test]
    #[serial]
    fn missing_file_is_defaults_but_garbage_is_error() {
        let cfg = AppConfig::load_from_file("definitely/not/here.toml").unwrap();
        assert_eq!(cfg.cache, CacheConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("bad.toml");
        std::fs::write(&p, "[oracle\nenabled = ").unwrap();
        assert!(AppConfig::load_from_file(&p).is_err());
    }

    #[test]
    #[serial]
    fn rate_limit_section_parses_and_zero_rates_reset() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.rate_limit, RateLimitConfig::default());
        assert!(cfg.rate_limit.enabled);

        let cfg = AppConfig::from_toml_str(
            r#"
            [rate_limit]
            per_minute = 0
            image_per_minute = 4
            burst = 2
            trust_forwarded_for = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.rate_limit.per_minute, DEFAULT_TEXT_PER_MINUTE);
        assert_eq!(cfg.rate_limit.image_per_minute, 4);
        assert_eq!(cfg.rate_limit.burst, 2);
        assert!(cfg.rate_limit.trust_forwarded_for);
    }
}

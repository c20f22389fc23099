//! Content-hash result cache.
//!
//! Rows are append-only: lookups return the most recent row for a hash and
//! writes never update in place. List fields are stored as JSON array strings
//! so a row maps one-to-one onto a flat table.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::config::{CacheBackend, CacheConfig};
use crate::model::{AnalysisDetails, AnalysisResult, Source, Status};

/// Hex SHA-256 of the lower-cased, trimmed content.
pub fn content_hash(content: &str) -> String {
    let normalized = content.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRow {
    pub content_hash: String,
    pub original_content: String,
    pub trust_score: u8,
    pub status: String,
    pub analysis_message: String,
    /// JSON array string
    pub keywords: String,
    /// JSON array string
    pub flags: String,
    /// JSON array string of `Source` objects
    pub sources: String,
    pub created_at: DateTime<Utc>,
}

fn json_array<T: Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn parse_array<T: for<'de> Deserialize<'de>>(raw: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_default()
}

impl CacheRow {
    pub fn from_result(content: &str, result: &AnalysisResult) -> Self {
        Self {
            content_hash: content_hash(content),
            original_content: content.to_string(),
            trust_score: result.trust_score,
            status: result.status.as_str().to_string(),
            analysis_message: result.message.clone(),
            keywords: json_array(&result.analysis.keywords),
            flags: json_array(&result.analysis.flags),
            sources: json_array(&result.sources),
            created_at: Utc::now(),
        }
    }

    /// Rebuild a result. Sub-scores collapse onto the stored trust score and
    /// highlights are not persisted.
    pub fn to_result(&self) -> AnalysisResult {
        let score = self.trust_score.min(100);
        let status = Status::parse(&self.status).unwrap_or_else(|| Status::from_score(score));
        AnalysisResult {
            trust_score: score,
            status,
            message: if self.analysis_message.trim().is_empty() {
                crate::analyze::normalize::DEFAULT_MESSAGE.to_string()
            } else {
                self.analysis_message.clone()
            },
            sources: parse_array::<Source>(&self.sources),
            analysis: AnalysisDetails {
                factual_accuracy: score,
                bias: score,
                source_quality: score,
                flags: parse_array(&self.flags),
                highlights: Vec::new(),
                keywords: parse_array(&self.keywords),
                checked_at: self.created_at,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache encode: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("cache lock poisoned")]
    Poisoned,
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Most recent row for `hash`, if any.
    async fn latest(&self, hash: &str) -> Result<Option<CacheRow>, CacheError>;
    /// Unconditional append.
    async fn insert(&self, row: CacheRow) -> Result<(), CacheError>;
    fn name(&self) -> &'static str;
}

/// Append-only rows in memory.
#[derive(Debug, Default)]
pub struct MemoryCache {
    rows: Mutex<Vec<CacheRow>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn latest(&self, hash: &str) -> Result<Option<CacheRow>, CacheError> {
        let g = self.rows.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(g.iter().rev().find(|r| r.content_hash == hash).cloned())
    }

    async fn insert(&self, row: CacheRow) -> Result<(), CacheError> {
        let mut g = self.rows.lock().map_err(|_| CacheError::Poisoned)?;
        g.push(row);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// JSON-lines file, one row per line. Malformed lines are skipped on read.
#[derive(Debug)]
pub struct JsonlCache {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CacheStore for JsonlCache {
    async fn latest(&self, hash: &str) -> Result<Option<CacheRow>, CacheError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut found = None;
        for (n, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CacheRow>(line) {
                Ok(row) if row.content_hash == hash => found = Some(row),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(target: "cache", line = n + 1, error = %e, "skipping malformed cache line")
                }
            }
        }
        Ok(found)
    }

    async fn insert(&self, row: CacheRow) -> Result<(), CacheError> {
        let mut line = serde_json::to_string(&row)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        f.write_all(line.as_bytes()).await?;
        f.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

pub type DynCache = Arc<dyn CacheStore>;

pub fn build_cache(cfg: &CacheConfig) -> DynCache {
    match cfg.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Jsonl => Arc::new(JsonlCache::new(&cfg.path)),
    }
}

// src/analyze/mod.rs
//! Local analysis pipeline: pattern tables, heuristic scoring, oracle reply
//! normalization and score blending. Everything here is pure and synchronous.

pub mod heuristic;
pub mod keywords;
pub mod normalize;
pub mod patterns;
pub mod scoring;
pub mod sources;

// Re-export convenient types.
pub use crate::analyze::heuristic::{score_content, Signals};
pub use crate::analyze::keywords::extract_keywords;
pub use crate::analyze::normalize::{
    parse_analysis_reply, parse_media_reply, parse_source_reply, OracleAnalysis, ParseOutcome,
};
pub use crate::analyze::scoring::{blend, BlendInputs, BlendWeights};
pub use crate::analyze::sources::extract_sources;

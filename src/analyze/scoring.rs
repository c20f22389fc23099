//! Trust score blender.
//!
//! `BlendInputs` holds the three oracle sub-scores in [0,100]:
//! - `factual_accuracy` : how well the claims hold up
//! - `bias`             : neutrality (higher is less biased)
//! - `source_quality`   : authority of what is cited
//!
//! Base = explicit oracle score if present, else the weighted sum.
//! Flags subtract up to 30, highlights add up to 15; result is clamped to 0–100.

use super::sources::clamp_score;

pub const FLAG_PENALTY: f64 = 5.0;
pub const FLAG_PENALTY_CAP: f64 = 30.0;
pub const HIGHLIGHT_BONUS: f64 = 3.0;
pub const HIGHLIGHT_BONUS_CAP: f64 = 15.0;

/// Sub-score weights. They sum to 1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendWeights {
    pub w_factual: f64,
    pub w_bias: f64,
    pub w_source: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            w_factual: 0.5,
            w_bias: 0.3,
            w_source: 0.2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BlendInputs {
    pub factual_accuracy: u8,
    pub bias: u8,
    pub source_quality: u8,
    /// Oracle-supplied overall score; replaces the weighted sum when set.
    pub explicit: Option<u8>,
}

impl BlendInputs {
    fn base(&self, w: &BlendWeights) -> f64 {
        match self.explicit {
            Some(s) => f64::from(s),
            None => {
                f64::from(self.factual_accuracy) * w.w_factual
                    + f64::from(self.bias) * w.w_bias
                    + f64::from(self.source_quality) * w.w_source
            }
        }
    }
}

/// Blend with default weights.
pub fn blend(inputs: &BlendInputs, flag_count: usize, highlight_count: usize) -> u8 {
    blend_with(inputs, flag_count, highlight_count, &BlendWeights::default())
}

pub fn blend_with(
    inputs: &BlendInputs,
    flag_count: usize,
    highlight_count: usize,
    w: &BlendWeights,
) -> u8 {
    let penalty = (FLAG_PENALTY * flag_count as f64).min(FLAG_PENALTY_CAP);
    let bonus = (HIGHLIGHT_BONUS * highlight_count as f64).min(HIGHLIGHT_BONUS_CAP);
    clamp_score(inputs.base(w) - penalty + bonus)
}

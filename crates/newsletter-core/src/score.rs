//! Numeric coercion of importance/arousal/valence.
//!
//! Stores persist these scores as text and the summarization service is free to
//! send numbers, strings or garbage. Everything is funnelled through
//! [`parse_score`], which never fails: absent, unparsable and non-finite values
//! all rank as `0.0`. So do booleans, and `"inf"` / `"Infinity"` text.

use std::cmp::Ordering;

use crate::types::{CandidateItem, RawScore};

/// Value used for any score that is missing or cannot be read as a number.
pub const DEFAULT_SCORE: f64 = 0.0;

/// Parse a raw score, returning `None` when it is absent or malformed.
pub fn try_parse_score(raw: Option<&RawScore>) -> Option<f64> {
    let value = match raw? {
        RawScore::Number(n) => *n,
        RawScore::Text(s) => s.trim().parse::<f64>().ok()?,
        RawScore::Other(_) => return None,
    };
    value.is_finite().then_some(value)
}

/// Parse a raw score, defaulting to [`DEFAULT_SCORE`].
pub fn parse_score(raw: Option<&RawScore>) -> f64 {
    try_parse_score(raw).unwrap_or(DEFAULT_SCORE)
}

/// Composite ranking key of a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreKey {
    pub importance: f64,
    pub arousal: f64,
    pub valence: f64,
}

impl ScoreKey {
    /// Descending order: importance first, then arousal, then valence.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .importance
            .partial_cmp(&self.importance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                other
                    .arousal
                    .partial_cmp(&self.arousal)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| {
                other
                    .valence
                    .partial_cmp(&self.valence)
                    .unwrap_or(Ordering::Equal)
            })
    }
}

impl From<&CandidateItem> for ScoreKey {
    fn from(item: &CandidateItem) -> Self {
        Self {
            importance: item.importance_value(),
            arousal: item.arousal_value(),
            valence: item.valence_value(),
        }
    }
}

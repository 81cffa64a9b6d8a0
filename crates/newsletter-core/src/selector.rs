//! Ranking selector
//!
//! Picks the handful of candidates that make it into a digest. Summaries whose
//! length falls inside the policy window are preferred; when none do, the
//! shortest over-long summaries stand in. Summaries shorter than the window are
//! never used. The survivors are ranked by importance, arousal and valence.

use serde::{Deserialize, Serialize};

use crate::error::{NewsletterError, NewsletterResult};
use crate::score::ScoreKey;
use crate::types::CandidateItem;

/// Length window and output bound for digest selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Minimum summary length in characters (inclusive)
    pub min_len: usize,
    /// Maximum summary length in characters (inclusive)
    pub max_len: usize,
    /// Maximum number of items returned
    pub max_count: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            min_len: 150,
            max_len: 400,
            max_count: 5,
        }
    }
}

impl SelectionPolicy {
    pub fn validate(&self) -> NewsletterResult<()> {
        if self.min_len > self.max_len {
            return Err(NewsletterError::Config(format!(
                "summary min length {} exceeds max length {}",
                self.min_len, self.max_len
            )));
        }
        if self.max_count == 0 {
            return Err(NewsletterError::Config(
                "summary max count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn in_range(&self, len: usize) -> bool {
        self.min_len <= len && len <= self.max_len
    }

    pub fn select(&self, candidates: Vec<CandidateItem>) -> Vec<CandidateItem> {
        select_best_summaries(candidates, self)
    }
}

/// Select the best summaries for a digest.
///
/// Deterministic: every sort is stable, so identical input yields identical
/// output. Scores are coerced on the fly and the items are returned unchanged.
pub fn select_best_summaries(
    candidates: Vec<CandidateItem>,
    policy: &SelectionPolicy,
) -> Vec<CandidateItem> {
    let (mut working, rest): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| policy.in_range(c.summary_len()));

    if working.is_empty() {
        working = rest
            .into_iter()
            .filter(|c| c.summary_len() > policy.max_len)
            .collect();
        working.sort_by_key(CandidateItem::summary_len);
    }

    let mut ranked: Vec<(ScoreKey, CandidateItem)> = working
        .into_iter()
        .map(|c| (c.score_key(), c))
        .collect();
    ranked.sort_by(|a, b| a.0.rank_cmp(&b.0));

    ranked
        .into_iter()
        .take(policy.max_count)
        .map(|(_, c)| c)
        .collect()
}

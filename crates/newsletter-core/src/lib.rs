pub mod collector;
pub mod error;
pub mod score;
pub mod selector;
pub mod strategy;
#[cfg(test)]
mod testing;
pub mod traits;
pub mod types;

pub use collector::CandidateCollector;
pub use error::*;
pub use score::{parse_score, try_parse_score, ScoreKey};
pub use selector::{select_best_summaries, SelectionPolicy};
pub use strategy::{
    CollectionStrategy, PrecomputedJoin, PrecomputedSingleTable, RemoteSummarization,
};
pub use traits::*;
pub use types::*;

/// Number of most-recent articles fetched per ticker.
pub const ARTICLES_PER_TICKER: usize = 10;

/// Reference timeout for one outbound summarization call.
pub const SUMMARIZER_TIMEOUT_SECS: u64 = 10;

//! Language-pattern analysis
//!
//! This module provides the keyword analyzer and per-speaker statistics:
//! - Flat case-insensitive substring matching against four fixed phrase lists
//! - Per-fragment set-membership counting (a repeated phrase counts once)
//! - Monotonic per-speaker accumulators safe for concurrent read/write

mod keywords;
mod stats;

pub use keywords::{
    KeywordAnalyzer, StatsDelta, I_PHRASES, PRAISE_PHRASES, TENSION_PHRASES, YOU_PHRASES,
};
pub use stats::{ConversationStats, Speaker, StatsStore};

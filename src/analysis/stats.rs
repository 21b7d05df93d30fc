use super::keywords::StatsDelta;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// One of the two conversation participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    A,
    B,
}

impl Speaker {
    pub fn other(self) -> Self {
        match self {
            Speaker::A => Speaker::B,
            Speaker::B => Speaker::A,
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speaker::A => write!(f, "A"),
            Speaker::B => write!(f, "B"),
        }
    }
}

/// Read-only snapshot of one speaker's accumulated statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub word_count: u64,
    pub time_spent_secs: u64,
    pub i_statements: u64,
    pub you_statements: u64,
    pub praise_count: u64,
    pub tension_phrases: u64,
}

#[derive(Default)]
struct SpeakerCounters {
    word_count: AtomicU64,
    time_spent_secs: AtomicU64,
    i_statements: AtomicU64,
    you_statements: AtomicU64,
    praise_count: AtomicU64,
    tension_phrases: AtomicU64,
}

impl SpeakerCounters {
    fn apply(&self, delta: &StatsDelta) {
        self.word_count.fetch_add(delta.words, Ordering::SeqCst);
        self.i_statements.fetch_add(delta.i_statements, Ordering::SeqCst);
        self.you_statements.fetch_add(delta.you_statements, Ordering::SeqCst);
        self.praise_count.fetch_add(delta.praise, Ordering::SeqCst);
        self.tension_phrases.fetch_add(delta.tension, Ordering::SeqCst);
    }

    fn tick_second(&self) {
        self.time_spent_secs.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> ConversationStats {
        ConversationStats {
            word_count: self.word_count.load(Ordering::SeqCst),
            time_spent_secs: self.time_spent_secs.load(Ordering::SeqCst),
            i_statements: self.i_statements.load(Ordering::SeqCst),
            you_statements: self.you_statements.load(Ordering::SeqCst),
            praise_count: self.praise_count.load(Ordering::SeqCst),
            tension_phrases: self.tension_phrases.load(Ordering::SeqCst),
        }
    }
}

/// Per-speaker statistics accumulators for one session
///
/// All mutations are additive; counters only reset by constructing a fresh
/// store when a new session begins. Atomic fields allow the timer task and
/// the analyzer to write while readers take snapshots.
#[derive(Default)]
pub struct StatsStore {
    a: SpeakerCounters,
    b: SpeakerCounters,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, speaker: Speaker) -> &SpeakerCounters {
        match speaker {
            Speaker::A => &self.a,
            Speaker::B => &self.b,
        }
    }

    /// Apply one fragment's analyzer increments to the named speaker
    pub fn apply(&self, speaker: Speaker, delta: &StatsDelta) {
        self.counters(speaker).apply(delta);
    }

    /// Advance the named speaker's time-spent counter by one second
    pub fn tick_second(&self, speaker: Speaker) {
        self.counters(speaker).tick_second();
    }

    /// Read-only copy of the named speaker's current statistics
    pub fn snapshot(&self, speaker: Speaker) -> ConversationStats {
        self.counters(speaker).snapshot()
    }
}

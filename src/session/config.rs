use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Per-turn limits, fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Maximum words one speaker may say in a turn
    pub max_words: u64,

    /// Maximum seconds one turn may last
    pub max_seconds: u64,
}

impl TurnConfig {
    /// Build a validated turn config; both limits must be positive.
    pub fn new(max_words: u64, max_seconds: u64) -> Result<Self> {
        ensure!(max_words > 0, "max_words must be positive");
        ensure!(max_seconds > 0, "max_seconds must be positive");

        Ok(Self {
            max_words,
            max_seconds,
        })
    }
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_words: 150,
            max_seconds: 120,
        }
    }
}

/// Configuration for a mediation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Sample rate for audio capture (the transcription service expects 16kHz)
    pub sample_rate: u32,

    /// Samples per audio block handed to the encoder
    pub block_size: usize,

    /// Turn limits used for alarm derivation
    pub limits: TurnConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            sample_rate: crate::audio::SAMPLE_RATE,
            block_size: 4096,
            limits: TurnConfig::default(),
        }
    }
}

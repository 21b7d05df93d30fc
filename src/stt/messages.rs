use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Audio frame sent to the transcription service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub session_id: String,
    pub data: String, // Base64-encoded little-endian 16-bit PCM
    pub mime_type: String,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Transcript fragment received from the transcription service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub timestamp: String,
}

impl AudioFrameMessage {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("Failed to serialize audio frame")
    }
}

impl TranscriptMessage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("Failed to parse transcript message")
    }
}

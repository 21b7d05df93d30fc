//! Mediation session management
//!
//! This module provides the `MediationSession` state machine that manages:
//! - The Idle/Recording/Paused lifecycle and the transcription connection
//! - Audio forwarding from the microphone to the streaming service
//! - Transcript delivery, keyword analysis, and speaker attribution
//! - The one-second turn timer and derived turn-limit alarms

mod config;
mod session;

pub use config::{SessionConfig, TurnConfig};
pub use session::{AlarmStatus, MediationSession, SessionState, TranscriptEntry};

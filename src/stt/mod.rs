//! Transcription service boundary
//!
//! The session treats speech-to-text as an opaque bidirectional stream:
//! base64-framed PCM out, transcript fragments and lifecycle events in.

mod messages;
mod scripted;
mod stream;

pub use messages::{AudioFrameMessage, TranscriptMessage};
pub use scripted::ScriptedStt;
pub use stream::{SttConnection, SttConnector, SttEvent};

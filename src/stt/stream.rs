use super::messages::AudioFrameMessage;
use anyhow::Result;
use tokio::sync::mpsc;

/// Lifecycle and transcript events emitted by the transcription service
#[derive(Debug, Clone)]
pub enum SttEvent {
    /// Connection established, service is accepting audio
    Opened,
    /// One transcript fragment; granularity is decided by the service
    Transcript(String),
    /// Connection-level failure with a user-presentable message
    Error(String),
    /// Connection closed by the remote end
    Closed,
}

/// An open bidirectional stream to the transcription service
///
/// Outbound audio frames go through `frames`; transcript and lifecycle
/// events arrive on `events`. Dropping the frame sender closes the
/// outbound half.
pub struct SttConnection {
    pub frames: mpsc::Sender<AudioFrameMessage>,
    pub events: mpsc::Receiver<SttEvent>,
}

/// Connector to a streaming transcription service
///
/// Implementations own transport details (websocket, gRPC, message bus);
/// the session only sees the frame/event channel pair.
#[async_trait::async_trait]
pub trait SttConnector: Send + Sync {
    /// Open a connection for the given session
    async fn connect(&self, session_id: &str) -> Result<SttConnection>;
}

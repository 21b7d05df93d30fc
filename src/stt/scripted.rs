use super::messages::AudioFrameMessage;
use super::stream::{SttConnection, SttConnector, SttEvent};
use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// In-process transcription service that replays a fixed fragment script
///
/// Emits `Opened`, then one `Transcript` per scripted fragment spaced by
/// `fragment_interval`, then `Closed`. Inbound audio frames are drained
/// and discarded. Used by the demo binary and integration tests.
pub struct ScriptedStt {
    fragments: Vec<String>,
    fragment_interval: Duration,
}

impl ScriptedStt {
    pub fn new(fragments: Vec<String>, fragment_interval: Duration) -> Self {
        Self {
            fragments,
            fragment_interval,
        }
    }
}

#[async_trait::async_trait]
impl SttConnector for ScriptedStt {
    async fn connect(&self, session_id: &str) -> Result<SttConnection> {
        let (frame_tx, mut frame_rx) = mpsc::channel::<AudioFrameMessage>(64);
        let (event_tx, event_rx) = mpsc::channel::<SttEvent>(64);

        debug!("scripted STT connected for session {}", session_id);

        // Drain and count inbound audio so the sender never backs up
        tokio::spawn(async move {
            let mut frames_received = 0usize;
            while frame_rx.recv().await.is_some() {
                frames_received += 1;
            }
            debug!("scripted STT drained {} audio frames", frames_received);
        });

        let fragments = self.fragments.clone();
        let interval = self.fragment_interval;

        tokio::spawn(async move {
            if event_tx.send(SttEvent::Opened).await.is_err() {
                return;
            }

            for fragment in fragments {
                tokio::time::sleep(interval).await;
                if event_tx.send(SttEvent::Transcript(fragment)).await.is_err() {
                    return;
                }
            }

            let _ = event_tx.send(SttEvent::Closed).await;
        });

        Ok(SttConnection {
            frames: frame_tx,
            events: event_rx,
        })
    }
}

// Integration tests for the mediation session state machine
//
// These drive the session with a hand-controlled transcription connector
// and microphone so event ordering and timing are deterministic
// (tokio's paused clock controls the turn timer).

use anyhow::{anyhow, Result};
use bridge_mediator::audio::{AudioBlock, MicrophoneBackend, MicrophoneConfig, NullMicrophone};
use bridge_mediator::session::{MediationSession, SessionConfig, SessionState, TurnConfig};
use bridge_mediator::stt::{AudioFrameMessage, ScriptedStt, SttConnection, SttConnector, SttEvent};
use bridge_mediator::Speaker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Connector whose event stream is fed by the test
struct ManualStt {
    events: StdMutex<Option<mpsc::Receiver<SttEvent>>>,
    frames: Arc<Mutex<Option<mpsc::Receiver<AudioFrameMessage>>>>,
}

impl ManualStt {
    fn new() -> (Arc<Self>, mpsc::Sender<SttEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let connector = Arc::new(Self {
            events: StdMutex::new(Some(rx)),
            frames: Arc::new(Mutex::new(None)),
        });
        (connector, tx)
    }

    async fn take_frames(&self) -> mpsc::Receiver<AudioFrameMessage> {
        self.frames
            .lock()
            .await
            .take()
            .expect("connect() must run before take_frames()")
    }
}

#[async_trait::async_trait]
impl SttConnector for ManualStt {
    async fn connect(&self, _session_id: &str) -> Result<SttConnection> {
        let events = self
            .events
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow!("already connected"))?;

        let (frame_tx, frame_rx) = mpsc::channel(64);
        *self.frames.lock().await = Some(frame_rx);

        Ok(SttConnection {
            frames: frame_tx,
            events,
        })
    }
}

/// Connector that blocks in connect() until the test releases it
struct StalledStt {
    release: StdMutex<Option<tokio::sync::oneshot::Receiver<()>>>,
    events: StdMutex<Option<mpsc::Receiver<SttEvent>>>,
}

impl StalledStt {
    fn new() -> (Arc<Self>, tokio::sync::oneshot::Sender<()>, mpsc::Sender<SttEvent>) {
        let (release_tx, release_rx) = tokio::sync::oneshot::channel();
        let (event_tx, event_rx) = mpsc::channel(8);
        let connector = Arc::new(Self {
            release: StdMutex::new(Some(release_rx)),
            events: StdMutex::new(Some(event_rx)),
        });
        (connector, release_tx, event_tx)
    }
}

#[async_trait::async_trait]
impl SttConnector for StalledStt {
    async fn connect(&self, _session_id: &str) -> Result<SttConnection> {
        let release = self
            .release
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow!("already connected"))?;
        let _ = release.await;

        let events = self
            .events
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow!("already connected"))?;
        let (frame_tx, _frame_rx) = mpsc::channel(64);

        Ok(SttConnection {
            frames: frame_tx,
            events,
        })
    }
}

/// Connector that always refuses to connect
struct FailingStt;

#[async_trait::async_trait]
impl SttConnector for FailingStt {
    async fn connect(&self, _session_id: &str) -> Result<SttConnection> {
        Err(anyhow!("service rejected the connection"))
    }
}

/// Microphone whose block stream is fed by the test
struct ManualMic {
    rx: StdMutex<Option<mpsc::Receiver<AudioBlock>>>,
    capturing: AtomicBool,
}

impl ManualMic {
    fn new() -> (Box<Self>, mpsc::Sender<AudioBlock>) {
        let (tx, rx) = mpsc::channel(64);
        let mic = Box::new(Self {
            rx: StdMutex::new(Some(rx)),
            capturing: AtomicBool::new(false),
        });
        (mic, tx)
    }
}

#[async_trait::async_trait]
impl MicrophoneBackend for ManualMic {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioBlock>> {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow!("already started"))?;
        self.capturing.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "manual"
    }
}

/// Microphone that fails to acquire the device
struct BrokenMic;

#[async_trait::async_trait]
impl MicrophoneBackend for BrokenMic {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioBlock>> {
        Err(anyhow!("permission denied"))
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "broken"
    }
}

fn test_config(max_words: u64, max_seconds: u64) -> SessionConfig {
    SessionConfig {
        limits: TurnConfig::new(max_words, max_seconds).unwrap(),
        ..SessionConfig::default()
    }
}

fn block(samples: Vec<f32>) -> AudioBlock {
    AudioBlock {
        samples,
        sample_rate: 16000,
        timestamp_ms: 0,
    }
}

/// Let spawned session tasks process pending events
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test(start_paused = true)]
async fn test_begin_transitions_idle_to_recording() {
    let (connector, _events) = ManualStt::new();
    let (mic, _blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(150, 120), connector);

    assert_eq!(session.state(), SessionState::Idle);
    session.begin(mic).await.unwrap();
    assert_eq!(session.state(), SessionState::Recording);
    assert_eq!(session.active_speaker(), Speaker::A);

    session.end().await.unwrap();
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_word_limit_scenario_triggers_alarm() {
    // Config {maxWords: 5, maxSeconds: 10}, speaker A active
    let (connector, events) = ManualStt::new();
    let (mic, _blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(5, 10), connector);
    session.begin(mic).await.unwrap();

    events
        .send(SttEvent::Transcript("I feel sad and hurt".to_string()))
        .await
        .unwrap();
    settle().await;

    let stats = session.stats(Speaker::A);
    assert_eq!(stats.word_count, 5);
    assert_eq!(stats.i_statements, 1);
    assert_eq!(stats.tension_phrases, 1);

    let alarm = session.alarm();
    assert!(alarm.word_limit_up);
    assert!(!alarm.time_up);
    assert!(alarm.any());

    session.end().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_fragments_append_to_transcript_in_order() {
    let (connector, events) = ManualStt::new();
    let (mic, _blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(150, 120), connector);
    session.begin(mic).await.unwrap();

    for text in ["first", "second", "third"] {
        events
            .send(SttEvent::Transcript(text.to_string()))
            .await
            .unwrap();
    }
    settle().await;

    let transcript = session.transcript().await;
    let texts: Vec<&str> = transcript.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);

    session.clear_transcript().await;
    assert!(session.transcript().await.is_empty());
    // Clearing the log does not touch the accumulated stats
    assert_eq!(session.stats(Speaker::A).word_count, 3);

    session.end().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_empty_fragment_has_zero_effect() {
    let (connector, events) = ManualStt::new();
    let (mic, _blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(150, 120), connector);
    session.begin(mic).await.unwrap();

    events
        .send(SttEvent::Transcript(String::new()))
        .await
        .unwrap();
    settle().await;

    assert!(session.transcript().await.is_empty());
    assert_eq!(session.stats(Speaker::A), Default::default());

    session.end().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_timer_counts_only_while_recording() {
    let (connector, _events) = ManualStt::new();
    let (mic, _blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(150, 120), connector);
    session.begin(mic).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(session.active_seconds(), 2);
    assert_eq!(session.stats(Speaker::A).time_spent_secs, 2);

    session.pause();
    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert_eq!(session.active_seconds(), 2, "no ticks while paused");

    session.resume();
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(session.active_seconds(), 3, "resumes from current value");
    assert_eq!(session.stats(Speaker::A).time_spent_secs, 3);

    session.end().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_switch_speaker_resets_turn_clock_but_not_stats() {
    let (connector, events) = ManualStt::new();
    let (mic, _blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(150, 120), connector);
    session.begin(mic).await.unwrap();

    events
        .send(SttEvent::Transcript("I feel tired".to_string()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let a_before = session.stats(Speaker::A);
    assert_eq!(session.active_seconds(), 2);
    assert_eq!(a_before.word_count, 3);

    session.switch_speaker();

    assert_eq!(session.active_speaker(), Speaker::B);
    assert_eq!(session.active_seconds(), 0, "turn clock resets");
    assert_eq!(session.stats(Speaker::A), a_before, "cumulative stats kept");

    // Subsequent ticks and fragments go to speaker B
    events
        .send(SttEvent::Transcript("you never rest".to_string()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1200)).await;

    assert_eq!(session.stats(Speaker::B).word_count, 3);
    assert_eq!(session.stats(Speaker::B).you_statements, 1);
    assert_eq!(session.stats(Speaker::B).time_spent_secs, 1);
    assert_eq!(session.stats(Speaker::A), a_before);

    session.end().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_pause_stops_frame_forwarding_but_not_transcripts() {
    let (connector, events) = ManualStt::new();
    let (mic, blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(150, 120), connector.clone());
    session.begin(mic).await.unwrap();

    let mut frames = connector.take_frames().await;

    blocks.send(block(vec![0.5; 4])).await.unwrap();
    settle().await;
    let frame = frames.try_recv().expect("frame forwarded while recording");
    assert_eq!(frame.mime_type, "audio/pcm;rate=16000");
    assert!(!frame.final_frame);

    session.pause();
    assert_eq!(session.state(), SessionState::Paused);

    blocks.send(block(vec![0.5; 4])).await.unwrap();
    settle().await;
    assert!(
        frames.try_recv().is_err(),
        "no frames forwarded while paused"
    );

    // In-flight transcript events are still delivered and attributed to
    // the speaker active at delivery time
    events
        .send(SttEvent::Transcript("I feel heard".to_string()))
        .await
        .unwrap();
    settle().await;
    assert_eq!(session.stats(Speaker::A).word_count, 3);

    session.resume();
    blocks.send(block(vec![0.5; 4])).await.unwrap();
    settle().await;
    assert!(frames.try_recv().is_ok(), "forwarding resumes");

    session.end().await.unwrap();
}

#[test]
fn test_turn_config_rejects_zero_limits() {
    assert!(TurnConfig::new(0, 120).is_err());
    assert!(TurnConfig::new(150, 0).is_err());
    assert!(TurnConfig::new(1, 1).is_ok());

    let defaults = TurnConfig::default();
    assert_eq!(defaults.max_words, 150);
    assert_eq!(defaults.max_seconds, 120);
}

#[tokio::test]
async fn test_end_without_begin_is_a_noop() {
    let (connector, _events) = ManualStt::new();
    let session = MediationSession::new(test_config(150, 120), connector);

    session.end().await.unwrap();
    session.end().await.unwrap();
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_error_while_paused_forces_idle() {
    let (connector, events) = ManualStt::new();
    let (mic, _blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(150, 120), connector);
    session.begin(mic).await.unwrap();

    session.pause();
    events
        .send(SttEvent::Error("stream dropped".to_string()))
        .await
        .unwrap();
    settle().await;

    assert_eq!(session.state(), SessionState::Idle);
    let error = session.last_error().await.expect("error surfaced to user");
    assert!(error.contains("stream dropped"));

    // Cleanup after an error-forced stop stays idempotent
    session.end().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_closed_event_returns_session_to_idle() {
    let (connector, events) = ManualStt::new();
    let (mic, _blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(150, 120), connector);
    session.begin(mic).await.unwrap();

    events.send(SttEvent::Closed).await.unwrap();
    settle().await;

    assert_eq!(session.state(), SessionState::Idle);
    session.end().await.unwrap();
}

#[tokio::test]
async fn test_connection_failure_keeps_session_idle() {
    let (mic, _blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(150, 120), Arc::new(FailingStt));

    let result = session.begin(mic).await;
    assert!(result.is_err());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.last_error().await.is_some());
}

#[tokio::test]
async fn test_microphone_failure_keeps_session_idle() {
    let (connector, _events) = ManualStt::new();
    let session = MediationSession::new(test_config(150, 120), connector);

    let result = session.begin(Box::new(BrokenMic)).await;
    assert!(result.is_err());
    assert_eq!(session.state(), SessionState::Idle);

    let error = session.last_error().await.expect("error surfaced to user");
    assert!(error.contains("Microphone unavailable"));
}

#[tokio::test(start_paused = true)]
async fn test_begin_twice_is_idempotent() {
    let (connector, _events) = ManualStt::new();
    let (mic, _blocks) = ManualMic::new();
    let (second_mic, _second_blocks) = ManualMic::new();
    let session = MediationSession::new(test_config(150, 120), connector);

    session.begin(mic).await.unwrap();
    session.begin(second_mic).await.unwrap();
    assert_eq!(session.state(), SessionState::Recording);

    session.end().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_end_during_inflight_begin_leaves_session_idle() {
    let (connector, release, events) = StalledStt::new();
    let (mic, _blocks) = ManualMic::new();
    let session = Arc::new(MediationSession::new(test_config(150, 120), connector));

    // begin() stalls inside connect(); end() arrives while it is in flight
    let begun = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.begin(mic).await })
    };
    settle().await;

    session.end().await.unwrap();
    assert_eq!(session.state(), SessionState::Idle);

    release.send(()).unwrap();
    begun.await.unwrap().unwrap();

    // The late acquisitions were released; nothing was committed
    assert_eq!(session.state(), SessionState::Idle);
    assert!(
        events
            .send(SttEvent::Transcript("I feel fine".to_string()))
            .await
            .is_err(),
        "late connection must be discarded"
    );
    assert_eq!(session.stats(Speaker::A), Default::default());
}

#[tokio::test(start_paused = true)]
async fn test_scripted_session_end_to_end() {
    let connector = Arc::new(ScriptedStt::new(
        vec![
            "I feel like you never listen".to_string(),
            "you always walk away".to_string(),
        ],
        Duration::from_millis(200),
    ));
    let mic = Box::new(NullMicrophone::new(MicrophoneConfig::default()));

    let session = MediationSession::new(test_config(150, 120), connector);
    session.begin(mic).await.unwrap();

    tokio::time::sleep(Duration::from_millis(700)).await;
    session.end().await.unwrap();

    assert_eq!(session.state(), SessionState::Idle);

    let transcript = session.transcript().await;
    assert_eq!(transcript.len(), 2);

    let stats = session.stats(Speaker::A);
    assert_eq!(stats.word_count, 10);
    assert_eq!(stats.i_statements, 1);
    assert_eq!(stats.you_statements, 2, "\"you always\" and \"you never\"");
}

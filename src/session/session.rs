use super::config::SessionConfig;
use crate::analysis::{ConversationStats, KeywordAnalyzer, Speaker, StatsStore};
use crate::audio::{encode_block, MicrophoneBackend};
use crate::stt::{AudioFrameMessage, SttConnector, SttEvent};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Session lifecycle states
///
/// `Analyzing` is part of the domain model but never entered by the
/// machine itself; it is reserved for a future post-session analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Recording = 1,
    Paused = 2,
    Analyzing = 3,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => SessionState::Recording,
            2 => SessionState::Paused,
            3 => SessionState::Analyzing,
            _ => SessionState::Idle,
        }
    }
}

/// Shared cell holding the current session state
///
/// Long-lived tasks must re-read this at the point of use rather than
/// closing over a value captured at spawn time.
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn set(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

/// Shared cell holding the currently active speaker
struct SpeakerCell(AtomicU8);

impl SpeakerCell {
    fn new(speaker: Speaker) -> Self {
        Self(AtomicU8::new(speaker as u8))
    }

    fn get(&self) -> Speaker {
        match self.0.load(Ordering::SeqCst) {
            0 => Speaker::A,
            _ => Speaker::B,
        }
    }

    fn set(&self, speaker: Speaker) {
        self.0.store(speaker as u8, Ordering::SeqCst);
    }
}

/// One transcript fragment as received from the transcription service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Transcribed text
    pub text: String,

    /// When this fragment was received
    pub timestamp: DateTime<Utc>,
}

/// Turn-limit alarm, derived from current counters on every read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmStatus {
    pub time_up: bool,
    pub word_limit_up: bool,
}

impl AlarmStatus {
    pub fn any(&self) -> bool {
        self.time_up || self.word_limit_up
    }
}

/// A two-speaker mediation session
///
/// Owns the session state, the active-speaker identity, the per-speaker
/// statistics, and the transcription connection lifecycle. One instance
/// covers one session; statistics zero only when a new instance is built.
pub struct MediationSession {
    /// Session configuration
    config: SessionConfig,

    /// Connector used to open the transcription stream
    connector: Arc<dyn SttConnector>,

    /// Keyword analyzer applied to every delivered fragment
    analyzer: Arc<KeywordAnalyzer>,

    /// Current lifecycle state
    state: Arc<StateCell>,

    /// Currently active speaker
    speaker: Arc<SpeakerCell>,

    /// Per-speaker accumulated statistics
    stats: Arc<StatsStore>,

    /// Seconds elapsed in the active turn; zeroed on speaker switch
    active_seconds: Arc<AtomicU64>,

    /// Ordered transcript fragments; cleared only by explicit user action
    transcript: Arc<Mutex<Vec<TranscriptEntry>>>,

    /// Most recent user-visible error, if any
    last_error: Arc<Mutex<Option<String>>>,

    /// Microphone backend, held while acquired
    mic: Arc<Mutex<Option<Box<dyn MicrophoneBackend>>>>,

    /// Outbound frame sender; dropping it closes the audio stream
    frame_tx: Arc<Mutex<Option<mpsc::Sender<AudioFrameMessage>>>>,

    /// Shutdown signal for the session tasks
    shutdown: Arc<Mutex<Option<watch::Sender<bool>>>>,

    /// Bumped by `end()`; lets an in-flight `begin()` detect cancellation
    epoch: Arc<AtomicU64>,

    /// Serializes the commit phase of `begin()` against `end()` cleanup
    lifecycle: Arc<Mutex<()>>,

    /// Handle for the audio forwarding task
    audio_task: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// Handle for the transcript/lifecycle event task
    event_task: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// Handle for the one-second turn timer task
    timer_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MediationSession {
    pub fn new(config: SessionConfig, connector: Arc<dyn SttConnector>) -> Self {
        info!("Creating mediation session: {}", config.session_id);

        Self {
            config,
            connector,
            analyzer: Arc::new(KeywordAnalyzer::default()),
            state: Arc::new(StateCell::new(SessionState::Idle)),
            speaker: Arc::new(SpeakerCell::new(Speaker::A)),
            stats: Arc::new(StatsStore::new()),
            active_seconds: Arc::new(AtomicU64::new(0)),
            transcript: Arc::new(Mutex::new(Vec::new())),
            last_error: Arc::new(Mutex::new(None)),
            mic: Arc::new(Mutex::new(None)),
            frame_tx: Arc::new(Mutex::new(None)),
            shutdown: Arc::new(Mutex::new(None)),
            epoch: Arc::new(AtomicU64::new(0)),
            lifecycle: Arc::new(Mutex::new(())),
            audio_task: Arc::new(Mutex::new(None)),
            event_task: Arc::new(Mutex::new(None)),
            timer_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Begin the session: open the transcription stream, start the
    /// microphone, and transition `Idle -> Recording`.
    ///
    /// On any acquisition failure the session stays in `Idle`, the error is
    /// recorded for display, nothing partially acquired is retained, and
    /// the user must invoke `begin` again.
    pub async fn begin(&self, mut mic: Box<dyn MicrophoneBackend>) -> Result<()> {
        if self.state.get() != SessionState::Idle {
            warn!("Session already started");
            return Ok(());
        }

        info!("Beginning session: {}", self.config.session_id);

        // An end() issued while the acquisitions below are in flight bumps
        // the epoch; the commit phase re-checks it and backs out
        let begin_epoch = self.epoch.load(Ordering::SeqCst);

        let connection = match self.connector.connect(&self.config.session_id).await {
            Ok(conn) => conn,
            Err(e) => {
                self.record_error(format!("Connection failed: {}", e)).await;
                return Err(e).context("Failed to open transcription stream");
            }
        };

        let mic_rx = match mic.start().await {
            Ok(rx) => rx,
            Err(e) => {
                // Connection is dropped here; no partial state survives
                self.record_error(format!("Microphone unavailable: {}", e))
                    .await;
                return Err(e).context("Failed to start microphone");
            }
        };

        debug!("Session using microphone backend: {}", mic.name());

        let _guard = self.lifecycle.lock().await;

        if self.epoch.load(Ordering::SeqCst) != begin_epoch {
            warn!("Session ended while begin was in flight; releasing resources");
            if let Err(e) = mic.stop().await {
                error!("Failed to stop microphone: {}", e);
            }
            // Connection is dropped here; the session stays Idle
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        {
            let mut frame_tx = self.frame_tx.lock().await;
            *frame_tx = Some(connection.frames.clone());
        }
        {
            let mut held = self.mic.lock().await;
            *held = Some(mic);
        }
        {
            let mut shutdown = self.shutdown.lock().await;
            *shutdown = Some(shutdown_tx);
        }

        self.state.set(SessionState::Recording);

        let audio_task = self.spawn_audio_task(mic_rx, connection.frames, shutdown_rx.clone());
        let event_task = self.spawn_event_task(connection.events, shutdown_rx.clone());
        let timer_task = self.spawn_timer_task(shutdown_rx);

        *self.audio_task.lock().await = Some(audio_task);
        *self.event_task.lock().await = Some(event_task);
        *self.timer_task.lock().await = Some(timer_task);

        info!("Session recording");

        Ok(())
    }

    /// Pause frame forwarding; the stream stays open and in-flight
    /// transcript events continue to be delivered.
    pub fn pause(&self) {
        if self.state.get() == SessionState::Recording {
            self.state.set(SessionState::Paused);
            info!("Session paused");
        }
    }

    /// Resume frame forwarding after a pause.
    pub fn resume(&self) {
        if self.state.get() == SessionState::Paused {
            self.state.set(SessionState::Recording);
            info!("Session resumed");
        }
    }

    /// Toggle the active speaker and zero the active-turn clock.
    ///
    /// Cumulative per-speaker statistics are untouched; only subsequent
    /// fragment attribution and timer ticks move to the other speaker.
    pub fn switch_speaker(&self) {
        let next = self.speaker.get().other();
        self.speaker.set(next);
        self.active_seconds.store(0, Ordering::SeqCst);
        info!("Active speaker is now {}", next);
    }

    /// Clear the transcript log. Explicit user action; the log is never
    /// cleared automatically.
    pub async fn clear_transcript(&self) {
        let mut transcript = self.transcript.lock().await;
        transcript.clear();
    }

    /// End the session: release the microphone, close the transcription
    /// stream, and return to `Idle`.
    ///
    /// Terminal and idempotent; a no-op when nothing was acquired, safe to
    /// call while a `begin` is still settling or an error is pending.
    pub async fn end(&self) -> Result<()> {
        self.epoch.fetch_add(1, Ordering::SeqCst);

        let _guard = self.lifecycle.lock().await;

        self.state.set(SessionState::Idle);

        if let Some(shutdown) = self.shutdown.lock().await.take() {
            let _ = shutdown.send(true);
        }

        if let Some(tx) = self.frame_tx.lock().await.take() {
            drop(tx);
        }

        if let Some(mut mic) = self.mic.lock().await.take() {
            if let Err(e) = mic.stop().await {
                error!("Failed to stop microphone: {}", e);
            }
        }

        for handle in [&self.audio_task, &self.event_task, &self.timer_task] {
            let mut slot = handle.lock().await;
            if let Some(task) = slot.take() {
                if let Err(e) = task.await {
                    error!("Session task panicked: {}", e);
                }
            }
        }

        info!("Session ended: {}", self.config.session_id);

        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Currently active speaker
    pub fn active_speaker(&self) -> Speaker {
        self.speaker.get()
    }

    /// Seconds elapsed in the active turn
    pub fn active_seconds(&self) -> u64 {
        self.active_seconds.load(Ordering::SeqCst)
    }

    /// Read-only statistics snapshot for one speaker
    pub fn stats(&self, speaker: Speaker) -> ConversationStats {
        self.stats.snapshot(speaker)
    }

    /// Accumulated transcript fragments
    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        let transcript = self.transcript.lock().await;
        transcript.clone()
    }

    /// Most recent user-visible error, if any
    pub async fn last_error(&self) -> Option<String> {
        let last_error = self.last_error.lock().await;
        last_error.clone()
    }

    /// Derive the turn-limit alarm from the current counters.
    ///
    /// Pure view over the active-turn clock and the active speaker's word
    /// count; recomputed on every call, never stored.
    pub fn alarm(&self) -> AlarmStatus {
        let stats = self.stats.snapshot(self.speaker.get());

        AlarmStatus {
            time_up: self.active_seconds() >= self.config.limits.max_seconds,
            word_limit_up: stats.word_count >= self.config.limits.max_words,
        }
    }

    async fn record_error(&self, message: String) {
        error!("{}", message);
        let mut last_error = self.last_error.lock().await;
        *last_error = Some(message);
    }

    /// Forward encoded microphone blocks to the transcription stream.
    ///
    /// The forwarding decision re-reads the current state per block, so a
    /// pause takes effect on the very next block.
    fn spawn_audio_task(
        &self,
        mut mic_rx: mpsc::Receiver<crate::audio::AudioBlock>,
        frames: mpsc::Sender<AudioFrameMessage>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let session_id = self.config.session_id.clone();

        tokio::spawn(async move {
            debug!("Audio forwarding task started");

            loop {
                let block = tokio::select! {
                    maybe = mic_rx.recv() => match maybe {
                        Some(block) => block,
                        None => break,
                    },
                    _ = shutdown_rx.changed() => break,
                };

                match state.get() {
                    SessionState::Recording => {}
                    SessionState::Idle => break,
                    // Paused: capture continues but nothing is forwarded
                    _ => continue,
                };

                let encoded = encode_block(&block.samples);
                let frame = AudioFrameMessage {
                    session_id: session_id.clone(),
                    data: encoded.data,
                    mime_type: encoded.mime_type,
                    timestamp: Utc::now().to_rfc3339(),
                    final_frame: false,
                };

                if frames.send(frame).await.is_err() {
                    debug!("Transcription stream closed; stopping audio forwarding");
                    break;
                }
            }

            debug!("Audio forwarding task stopped");
        })
    }

    /// Consume transcript and lifecycle events from the transcription
    /// stream.
    ///
    /// Fragments are attributed to the speaker active at delivery time. A
    /// connection error forces the session to `Idle` from any state and
    /// releases the audio resources.
    fn spawn_event_task(
        &self,
        mut events: mpsc::Receiver<SttEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let speaker = Arc::clone(&self.speaker);
        let stats = Arc::clone(&self.stats);
        let analyzer = Arc::clone(&self.analyzer);
        let transcript = Arc::clone(&self.transcript);
        let last_error = Arc::clone(&self.last_error);
        let mic = Arc::clone(&self.mic);
        let frame_tx = Arc::clone(&self.frame_tx);

        tokio::spawn(async move {
            debug!("Event task started");

            loop {
                let event = tokio::select! {
                    maybe = events.recv() => match maybe {
                        Some(event) => event,
                        None => break,
                    },
                    _ = shutdown_rx.changed() => break,
                };

                if state.get() == SessionState::Idle {
                    break;
                }

                match event {
                    SttEvent::Opened => {
                        debug!("Transcription stream opened");
                    }
                    SttEvent::Transcript(text) => {
                        if text.is_empty() {
                            continue;
                        }

                        {
                            let mut entries = transcript.lock().await;
                            entries.push(TranscriptEntry {
                                text: text.clone(),
                                timestamp: Utc::now(),
                            });
                        }

                        // Attribution is late-bound: the speaker is read at
                        // delivery time, not at capture time
                        let delta = analyzer.analyze(&text);
                        stats.apply(speaker.get(), &delta);
                    }
                    SttEvent::Error(message) => {
                        error!("Transcription stream error: {}", message);
                        {
                            let mut err = last_error.lock().await;
                            *err = Some(format!("Connection lost: {}", message));
                        }

                        state.set(SessionState::Idle);

                        if let Some(tx) = frame_tx.lock().await.take() {
                            drop(tx);
                        }
                        if let Some(mut m) = mic.lock().await.take() {
                            if let Err(e) = m.stop().await {
                                error!("Failed to stop microphone: {}", e);
                            }
                        }

                        break;
                    }
                    SttEvent::Closed => {
                        info!("Transcription stream closed");
                        state.set(SessionState::Idle);
                        break;
                    }
                }
            }

            debug!("Event task stopped");
        })
    }

    /// One-second turn timer.
    ///
    /// Ticks only count while the state is `Recording` at tick time; missed
    /// ticks are skipped rather than accumulated, so a resume continues
    /// from the current value.
    fn spawn_timer_task(&self, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let speaker = Arc::clone(&self.speaker);
        let stats = Arc::clone(&self.stats);
        let active_seconds = Arc::clone(&self.active_seconds);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // The first tick of a tokio interval completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }

                match state.get() {
                    SessionState::Recording => {
                        active_seconds.fetch_add(1, Ordering::SeqCst);
                        stats.tick_second(speaker.get());
                    }
                    SessionState::Idle => break,
                    _ => {}
                }
            }

            debug!("Turn timer stopped");
        })
    }
}

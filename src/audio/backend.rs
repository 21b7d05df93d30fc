use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

/// A block of captured microphone audio (normalized f32, mono)
#[derive(Debug, Clone)]
pub struct AudioBlock {
    /// Normalized samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for microphone capture
#[derive(Debug, Clone)]
pub struct MicrophoneConfig {
    /// Capture sample rate (the transcription service expects 16kHz)
    pub sample_rate: u32,
    /// Samples per delivered block
    pub block_size: usize,
}

impl Default for MicrophoneConfig {
    fn default() -> Self {
        Self {
            sample_rate: super::encoder::SAMPLE_RATE,
            block_size: 4096,
        }
    }
}

/// Microphone capture backend trait
///
/// Platform backends (cpal, OS media APIs) live behind this seam; the
/// session only consumes the block channel. `NullMicrophone` provides a
/// silence source for demos and tests.
#[async_trait::async_trait]
pub trait MicrophoneBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio blocks. Errors
    /// here (permission denied, device unavailable) abort session start.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioBlock>>;

    /// Stop capturing audio and release the device
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Silence-generating microphone for demos and tests
pub struct NullMicrophone {
    config: MicrophoneConfig,
    capturing: bool,
    stop_tx: Option<tokio::sync::watch::Sender<bool>>,
}

impl NullMicrophone {
    pub fn new(config: MicrophoneConfig) -> Self {
        Self {
            config,
            capturing: false,
            stop_tx: None,
        }
    }
}

#[async_trait::async_trait]
impl MicrophoneBackend for NullMicrophone {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioBlock>> {
        let (tx, rx) = mpsc::channel(16);
        let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);

        let sample_rate = self.config.sample_rate;
        let block_size = self.config.block_size;
        let block_ms = (block_size as u64 * 1000) / sample_rate as u64;

        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_millis(block_ms.max(1)));
            let mut elapsed_ms = 0u64;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let block = AudioBlock {
                            samples: vec![0.0; block_size],
                            sample_rate,
                            timestamp_ms: elapsed_ms,
                        };
                        elapsed_ms += block_ms;

                        if tx.send(block).await.is_err() {
                            break;
                        }
                    }
                    _ = stop_rx.changed() => {
                        break;
                    }
                }
            }

            debug!("null microphone stopped");
        });

        self.stop_tx = Some(stop_tx);
        self.capturing = true;

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(true);
        }
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "null"
    }
}

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Sample rate the transcription service expects (16kHz mono)
pub const SAMPLE_RATE: u32 = 16_000;

/// Fixed MIME descriptor attached to every outbound frame
pub const PCM_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// A block of normalized audio, base64-framed for transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedFrame {
    /// Base64-encoded little-endian 16-bit PCM
    pub data: String,

    /// MIME descriptor (always [`PCM_MIME_TYPE`])
    pub mime_type: String,
}

/// Convert normalized `[-1.0, 1.0]` samples to little-endian 16-bit PCM bytes.
///
/// Samples are scaled by 32768 with *wrapping* conversion: values outside the
/// nominal range overflow silently rather than clamping, so `1.0` becomes
/// `i16::MIN`. This matches the upstream capture path, which packs into a
/// 16-bit buffer without range checks.
pub fn pcm_bytes(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .map(|s| (s * 32768.0) as i32 as i16)
        .flat_map(|s| s.to_le_bytes())
        .collect()
}

/// Encode a block of normalized samples into a transport-ready frame.
///
/// Pure function of its input; no error conditions.
pub fn encode_block(samples: &[f32]) -> EncodedFrame {
    let bytes = pcm_bytes(samples);

    EncodedFrame {
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
        mime_type: PCM_MIME_TYPE.to_string(),
    }
}

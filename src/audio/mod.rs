pub mod backend;
pub mod encoder;

pub use backend::{AudioBlock, MicrophoneBackend, MicrophoneConfig, NullMicrophone};
pub use encoder::{encode_block, pcm_bytes, EncodedFrame, PCM_MIME_TYPE, SAMPLE_RATE};

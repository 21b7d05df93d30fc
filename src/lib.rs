pub mod analysis;
pub mod audio;
pub mod config;
pub mod scripture;
pub mod session;
pub mod stt;

pub use analysis::{ConversationStats, KeywordAnalyzer, Speaker, StatsDelta, StatsStore};
pub use audio::{
    encode_block, pcm_bytes, AudioBlock, EncodedFrame, MicrophoneBackend, MicrophoneConfig,
    NullMicrophone, PCM_MIME_TYPE, SAMPLE_RATE,
};
pub use config::Config;
pub use scripture::{by_category, random_scripture, Scripture, ScriptureCategory, SCRIPTURES};
pub use session::{
    AlarmStatus, MediationSession, SessionConfig, SessionState, TranscriptEntry, TurnConfig,
};
pub use stt::{
    AudioFrameMessage, ScriptedStt, SttConnection, SttConnector, SttEvent, TranscriptMessage,
};

use anyhow::Result;
use bridge_mediator::{
    random_scripture, Config, MediationSession, MicrophoneConfig, NullMicrophone, ScriptedStt,
    SessionConfig, Speaker, TurnConfig,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Run a scripted mediation session and print the resulting statistics
#[derive(Debug, Parser)]
#[command(name = "bridge-mediator")]
struct Args {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/bridge-mediator")]
    config: String,

    /// Override the per-turn word limit
    #[arg(long)]
    max_words: Option<u64>,

    /// Override the per-turn time limit in seconds
    #[arg(long)]
    max_seconds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);

    let limits = TurnConfig::new(
        args.max_words.unwrap_or(cfg.limits.max_words),
        args.max_seconds.unwrap_or(cfg.limits.max_seconds),
    )?;

    info!(
        "Turn limits: {} words / {} seconds",
        limits.max_words, limits.max_seconds
    );

    let session_config = SessionConfig {
        sample_rate: cfg.audio.sample_rate,
        block_size: cfg.audio.block_size,
        limits,
        ..SessionConfig::default()
    };

    // Demo: a scripted transcription service and a silent microphone
    let connector = Arc::new(ScriptedStt::new(
        vec![
            "I feel like we never talk anymore".to_string(),
            "You always change the subject".to_string(),
            "I appreciate you saying that".to_string(),
        ],
        Duration::from_millis(500),
    ));

    let mic = Box::new(NullMicrophone::new(MicrophoneConfig {
        sample_rate: session_config.sample_rate,
        block_size: session_config.block_size,
    }));

    let session = MediationSession::new(session_config, connector);
    session.begin(mic).await?;

    tokio::time::sleep(Duration::from_millis(900)).await;
    session.switch_speaker();
    tokio::time::sleep(Duration::from_millis(900)).await;

    session.end().await?;

    for speaker in [Speaker::A, Speaker::B] {
        let stats = session.stats(speaker);
        info!(
            "Speaker {}: {}",
            speaker,
            serde_json::to_string_pretty(&stats)?
        );
    }

    let scripture = random_scripture();
    info!("\"{}\" ({})", scripture.text, scripture.reference);

    Ok(())
}

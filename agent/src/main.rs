mod config;
mod policy;

use config::{AgentConfig, MediaMode};

use alertline_core::{
    CallSession, CaseStore, DeepgramStt, GeminiClient, LoadFraudCaseTool, MurfTts, ToolRegistry,
    TurnOutput, UpdateFraudCaseTool, UsageCollector,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,alertline_core=info,fraud_agent=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        target: "fraud_agent",
        "Starting fraud-alert agent worker: Caller → STT → LLM → Tools → TTS"
    );

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = AgentConfig::load();

    // Case store and the two tools the model may call during the dialogue
    let store = Arc::new(CaseStore::new(cfg.store_path.clone()));
    let registry = Arc::new(ToolRegistry::new());
    registry.register(Arc::new(LoadFraudCaseTool::new(Arc::clone(&store))));
    registry.register(Arc::new(UpdateFraudCaseTool::new(Arc::clone(&store))));

    // Hosted pipeline providers
    let llm = Arc::new(GeminiClient::new(cfg.llm.clone())?);
    let stt = Arc::new(DeepgramStt::new(cfg.stt.clone())?);
    let usage = Arc::new(UsageCollector::new());

    let mut session = CallSession::new(
        cfg.instructions.clone(),
        cfg.greeting.clone(),
        llm,
        Arc::clone(&registry),
        Arc::clone(&usage),
    )
    .with_stt(stt);

    if cfg.tts.api_key.is_some() {
        session = session.with_tts(Arc::new(MurfTts::new(cfg.tts.clone())?));
    } else {
        warn!(target: "fraud_agent", "MURF_API_KEY not set; replies will not be synthesized");
    }

    // Serve the call until the caller hangs up or the operator stops us
    tokio::select! {
        res = serve_call(&mut session, &cfg) => {
            if let Err(e) = res {
                error!(target: "fraud_agent", error = %e, "Call ended with error");
            }
        }
        _ = signal::ctrl_c() => {
            info!(target: "fraud_agent", "Shutting down...");
        }
    }

    usage.log_summary().await;
    Ok(())
}

/// Run one call session over the configured media adapter. The telephony
/// transport that would normally carry caller audio is external; these
/// adapters stand in its place for development and operations drills.
async fn serve_call(session: &mut CallSession, cfg: &AgentConfig) -> alertline_core::Result<()> {
    // The agent speaks first
    let opening = session.greeting();
    let turn = session.speak(opening).await;
    deliver(&turn, cfg.audio_out_dir.as_deref(), 0).await;

    match cfg.media_mode {
        MediaMode::Text => serve_text_call(session, cfg).await,
        MediaMode::Wav => serve_wav_call(session, cfg).await,
    }
}

/// Caller utterances as lines on stdin; EOF is the hangup.
async fn serve_text_call(session: &mut CallSession, cfg: &AgentConfig) -> alertline_core::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut turn_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        turn_no += 1;

        info!(target: "fraud_agent", caller = %text, "➡️  Caller turn");
        let reply = session.handle_utterance(text).await?;
        info!(target: "fraud_agent", assistant = %reply, "🗣️  Speaking reply");
        println!("{reply}");

        let turn = session.speak(reply).await;
        deliver(&turn, cfg.audio_out_dir.as_deref(), turn_no).await;
    }

    info!(target: "fraud_agent", "Caller hung up");
    Ok(())
}

/// Caller utterances as audio files consumed from a spool directory, run
/// through the hosted transcription engine.
async fn serve_wav_call(session: &mut CallSession, cfg: &AgentConfig) -> alertline_core::Result<()> {
    tokio::fs::create_dir_all(&cfg.spool_dir).await?;
    info!(target: "fraud_agent", spool = %cfg.spool_dir.display(), "Watching call spool");
    let mut turn_no = 0usize;

    loop {
        let mut pending = Vec::new();
        let mut entries = tokio::fs::read_dir(&cfg.spool_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("wav") {
                pending.push(path);
            }
        }
        pending.sort();

        for path in pending {
            turn_no += 1;
            let audio = tokio::fs::read(&path).await?;
            let turn = session.handle_audio(audio, "audio/wav").await?;
            if !turn.text.is_empty() {
                info!(target: "fraud_agent", assistant = %turn.text, "🗣️  Speaking reply");
                println!("{}", turn.text);
            }
            deliver(&turn, cfg.audio_out_dir.as_deref(), turn_no).await;
            // Mark the utterance consumed so the next scan skips it
            let done = path.with_extension("wav.done");
            tokio::fs::rename(&path, &done).await?;
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

/// Write a turn's synthesized audio to the output directory, if both exist.
async fn deliver(turn: &TurnOutput, out_dir: Option<&Path>, turn_no: usize) {
    let (Some(audio), Some(dir)) = (&turn.audio, out_dir) else {
        return;
    };
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        error!(target: "fraud_agent", error = %e, "Failed to create audio output dir");
        return;
    }
    let path = dir.join(format!("turn_{turn_no:03}.{}", audio.format.to_lowercase()));
    match tokio::fs::write(&path, &audio.audio).await {
        Ok(()) => info!(target: "fraud_agent", path = %path.display(), "Reply audio written"),
        Err(e) => error!(target: "fraud_agent", error = %e, "Failed to write reply audio"),
    }
}

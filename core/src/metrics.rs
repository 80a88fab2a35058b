//! Aggregated usage accounting for one worker process, logged at shutdown.

use crate::llm::TokenUsage;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// Counters accumulated across every session the worker served.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageSummary {
    pub turns: u64,
    pub stt_audio_secs: f64,
    pub llm_prompt_tokens: u64,
    pub llm_completion_tokens: u64,
    pub tts_characters: u64,
    pub tool_calls: u64,
}

/// Usage collector shared by the sessions of one worker.
#[derive(Default)]
pub struct UsageCollector {
    usage: RwLock<UsageSummary>,
}

impl UsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_turn(&self) {
        self.usage.write().await.turns += 1;
    }

    pub async fn record_stt_audio(&self, secs: f64) {
        self.usage.write().await.stt_audio_secs += secs;
    }

    pub async fn record_llm_usage(&self, usage: TokenUsage) {
        let mut u = self.usage.write().await;
        u.llm_prompt_tokens += usage.prompt_tokens;
        u.llm_completion_tokens += usage.completion_tokens;
    }

    pub async fn record_tts_characters(&self, characters: u64) {
        self.usage.write().await.tts_characters += characters;
    }

    pub async fn record_tool_call(&self) {
        self.usage.write().await.tool_calls += 1;
    }

    pub async fn summary(&self) -> UsageSummary {
        self.usage.read().await.clone()
    }

    /// Print the summary to the log, one line per counter.
    pub async fn log_summary(&self) {
        let s = self.summary().await;
        info!(target: "usage", "=== Usage summary ===");
        info!(target: "usage", "Turns: {}", s.turns);
        info!(target: "usage", "STT audio: {:.1}s", s.stt_audio_secs);
        info!(
            target: "usage",
            "LLM tokens: {} prompt / {} completion",
            s.llm_prompt_tokens, s.llm_completion_tokens
        );
        info!(target: "usage", "TTS characters: {}", s.tts_characters);
        info!(target: "usage", "Tool calls: {}", s.tool_calls);
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use alertline_core::llm::LlmConfig;
use alertline_core::stt::SttConfig;
use alertline_core::tts::TtsConfig;

use crate::policy;

/// How caller utterances reach the worker while the telephony transport is
/// out of the picture: lines on stdin, or audio files from a spool directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaMode {
    Text,
    Wav,
}

impl MediaMode {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MediaMode::Text),
            "wav" => Some(MediaMode::Wav),
            _ => None,
        }
    }
}

/// High-level configuration for the fraud-alert worker
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// The fraud-case collection file behind the two tools.
    pub store_path: PathBuf,
    pub media_mode: MediaMode,
    /// Input directory for `wav` mode.
    pub spool_dir: PathBuf,
    /// Where synthesized replies land; None keeps turns text-only on disk.
    pub audio_out_dir: Option<PathBuf>,
    pub instructions: String,
    pub greeting: String,
    pub stt: SttConfig,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            store_path: std::env::var("FRAUD_CASES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/fraud_cases.json")),
            media_mode: std::env::var("MEDIA_MODE")
                .ok()
                .and_then(|s| MediaMode::parse(&s))
                .unwrap_or(MediaMode::Text),
            spool_dir: std::env::var("CALL_SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("calls")),
            audio_out_dir: std::env::var("AUDIO_OUT_DIR").ok().map(PathBuf::from),
            instructions: std::env::var("AGENT_INSTRUCTIONS")
                .unwrap_or_else(|_| policy::INSTRUCTIONS.to_string()),
            greeting: std::env::var("AGENT_GREETING")
                .unwrap_or_else(|_| policy::GREETING.to_string()),
            stt: SttConfig::default(),
            llm: LlmConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a TOML file (path via FRAUD_AGENT_CONFIG or
    /// ./fraud_agent.toml), overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let default = Self::default();
        let path =
            std::env::var("FRAUD_AGENT_CONFIG").unwrap_or_else(|_| "fraud_agent.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target: "fraud_agent", path = %path, "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match toml::from_str::<AgentToml>(&s) {
                Ok(t) => t.overlay(default),
                Err(e) => {
                    tracing::warn!(target: "fraud_agent", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "fraud_agent", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct AgentToml {
    pub store_path: Option<PathBuf>,
    pub media_mode: Option<String>,
    pub spool_dir: Option<PathBuf>,
    pub audio_out_dir: Option<PathBuf>,
    pub instructions: Option<String>,
    pub greeting: Option<String>,
    pub stt: Option<SttToml>,
    pub vad: Option<VadToml>,
    pub turn: Option<TurnToml>,
    pub llm: Option<LlmToml>,
    pub tts: Option<TtsToml>,
}

impl AgentToml {
    pub fn overlay(self, mut base: AgentConfig) -> AgentConfig {
        if let Some(p) = self.store_path {
            base.store_path = p;
        }
        if let Some(m) = self.media_mode.as_deref().and_then(MediaMode::parse) {
            base.media_mode = m;
        }
        if let Some(p) = self.spool_dir {
            base.spool_dir = p;
        }
        if let Some(p) = self.audio_out_dir {
            base.audio_out_dir = Some(p);
        }
        if let Some(i) = self.instructions {
            base.instructions = i;
        }
        if let Some(g) = self.greeting {
            base.greeting = g;
        }
        if let Some(s) = self.stt {
            s.apply(&mut base.stt);
        }
        if let Some(v) = self.vad {
            v.apply(&mut base.stt);
        }
        if let Some(t) = self.turn {
            t.apply(&mut base.stt);
        }
        if let Some(l) = self.llm {
            l.apply(&mut base.llm);
        }
        if let Some(t) = self.tts {
            t.apply(&mut base.tts);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SttToml {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub smart_format: Option<bool>,
    pub request_timeout_ms: Option<u64>,
}
impl SttToml {
    fn apply(self, s: &mut SttConfig) {
        if let Some(x) = self.base_url {
            s.base_url = x;
        }
        if let Some(x) = self.api_key {
            s.api_key = Some(x);
        }
        if let Some(x) = self.model {
            s.model = x;
        }
        if let Some(x) = self.language {
            s.language = x;
        }
        if let Some(x) = self.smart_format {
            s.smart_format = x;
        }
        if let Some(x) = self.request_timeout_ms {
            s.request_timeout_ms = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct VadToml {
    pub vad_events: Option<bool>,
    pub endpointing_ms: Option<u32>,
}
impl VadToml {
    fn apply(self, s: &mut SttConfig) {
        if let Some(x) = self.vad_events {
            s.vad.vad_events = x;
        }
        if let Some(x) = self.endpointing_ms {
            s.vad.endpointing_ms = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TurnToml {
    pub utterance_end_ms: Option<u32>,
}
impl TurnToml {
    fn apply(self, s: &mut SttConfig) {
        if let Some(x) = self.utterance_end_ms {
            s.turn.utterance_end_ms = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct LlmToml {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}
impl LlmToml {
    fn apply(self, l: &mut LlmConfig) {
        if let Some(x) = self.base_url {
            l.base_url = x;
        }
        if let Some(x) = self.model {
            l.model = x;
        }
        if let Some(x) = self.api_key {
            l.api_key = Some(x);
        }
        if let Some(x) = self.request_timeout_ms {
            l.request_timeout_ms = x;
        }
        if let Some(x) = self.temperature {
            l.temperature = x;
        }
        if let Some(x) = self.max_output_tokens {
            l.max_output_tokens = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TtsToml {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub voice: Option<String>,
    pub style: Option<String>,
    pub sample_rate: Option<u32>,
}
impl TtsToml {
    fn apply(self, t: &mut TtsConfig) {
        if let Some(x) = self.base_url {
            t.base_url = x;
        }
        if let Some(x) = self.api_key {
            t.api_key = Some(x);
        }
        if let Some(x) = self.voice {
            t.voice = x;
        }
        if let Some(x) = self.style {
            t.style = x;
        }
        if let Some(x) = self.sample_rate {
            t.sample_rate = x;
        }
    }
}

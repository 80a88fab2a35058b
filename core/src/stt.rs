//! Speech-to-text via Deepgram's hosted transcription API.
//!
//! Voice-activity detection and turn detection are hosted concerns on this
//! pipeline: they travel as request parameters on the transcription call
//! (`vad_events`, `endpointing`, `utterance_end_ms`) rather than running
//! in-process.

use crate::{AlertlineError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Voice-activity detection knobs forwarded to the hosted engine.
#[derive(Clone, Debug)]
pub struct VadConfig {
    /// Ask the engine to emit speech start/end events.
    pub vad_events: bool,
    /// Silence after speech, in ms, before the engine closes an utterance.
    pub endpointing_ms: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            vad_events: true,
            endpointing_ms: std::env::var("DEEPGRAM_ENDPOINTING_MS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(300),
        }
    }
}

/// Turn-detection knobs forwarded to the hosted engine.
#[derive(Clone, Debug)]
pub struct TurnConfig {
    /// Silence, in ms, after which the caller's turn is considered finished.
    pub utterance_end_ms: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            utterance_end_ms: std::env::var("DEEPGRAM_UTTERANCE_END_MS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(1000),
        }
    }
}

/// Deepgram client configuration, env-driven by default.
#[derive(Clone, Debug)]
pub struct SttConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub language: String,
    pub smart_format: bool,
    pub request_timeout_ms: u64,
    pub vad: VadConfig,
    pub turn: TurnConfig,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("DEEPGRAM_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://api.deepgram.com".to_string()),
            api_key: std::env::var("DEEPGRAM_API_KEY").ok().filter(|s| !s.is_empty()),
            model: std::env::var("DEEPGRAM_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "nova-3".to_string()),
            language: std::env::var("DEEPGRAM_LANGUAGE").unwrap_or_else(|_| "en".to_string()),
            smart_format: true,
            request_timeout_ms: std::env::var("DEEPGRAM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
            vad: VadConfig::default(),
            turn: TurnConfig::default(),
        }
    }
}

/// One finished caller utterance as heard by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub confidence: f64,
    pub duration_secs: f64,
}

/// Seam over the hosted transcription call.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, mime: &str) -> Result<Transcript>;
}

/// HTTP client for Deepgram's `/v1/listen` endpoint.
pub struct DeepgramStt {
    http: reqwest::Client,
    cfg: SttConfig,
}

impl DeepgramStt {
    pub fn new(cfg: SttConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| AlertlineError::SttError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SttConfig::default())
    }

    /// Full listen URL including the VAD / endpointing / turn parameters.
    pub fn listen_url(&self) -> String {
        format!(
            "{}/v1/listen?model={}&language={}&smart_format={}&vad_events={}&endpointing={}&utterance_end_ms={}",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.model,
            self.cfg.language,
            self.cfg.smart_format,
            self.cfg.vad.vad_events,
            self.cfg.vad.endpointing_ms,
            self.cfg.turn.utterance_end_ms,
        )
    }
}

#[async_trait]
impl SpeechToText for DeepgramStt {
    async fn transcribe(&self, audio: Vec<u8>, mime: &str) -> Result<Transcript> {
        let key = self.cfg.api_key.as_deref().ok_or_else(|| {
            AlertlineError::SttError("DEEPGRAM_API_KEY is not set".to_string())
        })?;

        let url = self.listen_url();
        debug!(target: "stt", url = %url, bytes = audio.len(), "Transcribing utterance");

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Token {key}"))
            .header("Content-Type", mime)
            .body(audio)
            .send()
            .await
            .map_err(|e| AlertlineError::SttError(format!("Transcription request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AlertlineError::SttError(format!(
                "Transcription API error: status={status} body={body}"
            )));
        }

        let data: ListenResponse = resp
            .json()
            .await
            .map_err(|e| AlertlineError::SttError(format!("Failed to parse transcription: {e}")))?;

        parse_listen_response(data)
    }
}

// ── response shapes ──

#[derive(Debug, Deserialize)]
pub struct ListenResponse {
    #[serde(default)]
    metadata: Option<ListenMetadata>,
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenMetadata {
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    transcript: String,
    confidence: Option<f64>,
}

/// Pick the engine's best alternative out of a listen response.
pub fn parse_listen_response(data: ListenResponse) -> Result<Transcript> {
    let duration_secs = data.metadata.and_then(|m| m.duration).unwrap_or(0.0);
    let best = data
        .results
        .channels
        .into_iter()
        .next()
        .and_then(|c| c.alternatives.into_iter().next())
        .ok_or_else(|| AlertlineError::SttError("Empty transcription response".to_string()))?;

    Ok(Transcript {
        text: best.transcript,
        confidence: best.confidence.unwrap_or(0.0),
        duration_secs,
    })
}

impl ListenResponse {
    /// Build a response from raw JSON, for callers holding a `Value`.
    pub fn from_value(v: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(v)?)
    }
}

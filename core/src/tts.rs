//! Text-to-speech via Murf's hosted synthesis API.

use crate::{AlertlineError, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Murf client configuration, env-driven by default. Voice and style mirror
/// the agent's on-call persona.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub voice: String,
    pub style: String,
    pub sample_rate: u32,
    pub format: String,
    pub request_timeout_ms: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("MURF_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://api.murf.ai".to_string()),
            api_key: std::env::var("MURF_API_KEY").ok().filter(|s| !s.is_empty()),
            voice: std::env::var("MURF_VOICE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "en-US-matthew".to_string()),
            style: std::env::var("MURF_STYLE").unwrap_or_else(|_| "Conversation".to_string()),
            sample_rate: std::env::var("MURF_SAMPLE_RATE")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(24_000),
            format: "WAV".to_string(),
            request_timeout_ms: std::env::var("MURF_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
        }
    }
}

/// Synthesized speech for one assistant turn.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub audio: Vec<u8>,
    pub format: String,
    pub duration_secs: f64,
    /// Characters billed by the provider for this synthesis.
    pub characters: u64,
}

/// Seam over the hosted synthesis call.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio>;
}

/// HTTP client for Murf's `/v1/speech/generate` endpoint.
pub struct MurfTts {
    http: reqwest::Client,
    cfg: TtsConfig,
}

impl MurfTts {
    pub fn new(cfg: TtsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| AlertlineError::TtsError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(TtsConfig::default())
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1/speech/generate",
            self.cfg.base_url.trim_end_matches('/')
        )
    }

    /// Assemble the synthesis request payload.
    pub fn build_request_body(&self, text: &str) -> Value {
        json!({
            "text": text,
            "voiceId": self.cfg.voice,
            "style": self.cfg.style,
            "sampleRate": self.cfg.sample_rate,
            "format": self.cfg.format,
            "encodeAsBase64": true,
        })
    }
}

#[async_trait]
impl TextToSpeech for MurfTts {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        let key = self
            .cfg
            .api_key
            .as_deref()
            .ok_or_else(|| AlertlineError::TtsError("MURF_API_KEY is not set".to_string()))?;

        let url = self.generate_url();
        debug!(target: "tts", url = %url, chars = text.len(), "Synthesizing reply");

        let resp = self
            .http
            .post(&url)
            .header("api-key", key)
            .json(&self.build_request_body(text))
            .send()
            .await
            .map_err(|e| AlertlineError::TtsError(format!("Synthesis request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AlertlineError::TtsError(format!(
                "Synthesis API error: status={status} body={body}"
            )));
        }

        let data: GenerateSpeechResponse = resp
            .json()
            .await
            .map_err(|e| AlertlineError::TtsError(format!("Failed to parse synthesis response: {e}")))?;

        let audio = if let Some(encoded) = data.encoded_audio.filter(|s| !s.is_empty()) {
            base64::engine::general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| AlertlineError::TtsError(format!("Invalid base64 audio: {e}")))?
        } else if let Some(file_url) = data.audio_file.filter(|s| !s.is_empty()) {
            // Some plans return a download URL instead of inline audio.
            let audio_resp = self
                .http
                .get(&file_url)
                .send()
                .await
                .map_err(|e| AlertlineError::TtsError(format!("Audio download failed: {e}")))?;
            audio_resp
                .bytes()
                .await
                .map_err(|e| AlertlineError::TtsError(format!("Audio download failed: {e}")))?
                .to_vec()
        } else {
            return Err(AlertlineError::TtsError(
                "Synthesis response carried no audio".to_string(),
            ));
        };

        Ok(SpeechAudio {
            audio,
            format: self.cfg.format.clone(),
            duration_secs: data.audio_length_in_seconds.unwrap_or(0.0),
            characters: data
                .consumed_character_count
                .unwrap_or(text.chars().count() as u64),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateSpeechResponse {
    #[serde(default)]
    encoded_audio: Option<String>,
    #[serde(default)]
    audio_file: Option<String>,
    #[serde(default)]
    audio_length_in_seconds: Option<f64>,
    #[serde(default)]
    consumed_character_count: Option<u64>,
}

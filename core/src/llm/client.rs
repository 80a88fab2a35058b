use super::{Content, LanguageModel, ModelTurn, TokenUsage, ToolCall, ToolDeclaration};
use crate::{AlertlineError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

/// Gemini client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("GEMINI_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            model: std::env::var("GEMINI_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
                .filter(|s| !s.is_empty()),
            request_timeout_ms: std::env::var("GEMINI_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
            temperature: std::env::var("GEMINI_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(0.7),
            max_output_tokens: std::env::var("GEMINI_MAX_OUTPUT_TOKENS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(1024),
        }
    }
}

/// HTTP client for Gemini's `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    cfg: LlmConfig,
}

impl GeminiClient {
    pub fn new(cfg: LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| AlertlineError::LlmError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(LlmConfig::default())
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.model,
        )
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(
        &self,
        system: &str,
        history: &[Content],
        tools: &[ToolDeclaration],
    ) -> Result<ModelTurn> {
        let key = self.cfg.api_key.as_deref().ok_or_else(|| {
            AlertlineError::LlmError("GEMINI_API_KEY is not set".to_string())
        })?;

        let url = self.generate_url();
        let body = build_generate_body(system, history, tools, &self.cfg);
        debug!(target: "llm_client", url = %url, turns = history.len(), "POST generateContent");

        let resp = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AlertlineError::LlmError(format!("Generate request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target: "llm_client", %status, body = %text, "Generate API error");
            return Err(AlertlineError::LlmError(format!(
                "Generate API error: status={status} body={text}"
            )));
        }

        let val: Value = resp
            .json()
            .await
            .map_err(|e| AlertlineError::LlmError(format!("Failed to parse generate JSON: {e}")))?;

        parse_generate_response(&val)
    }
}

/// Assemble the generateContent request payload.
pub fn build_generate_body(
    system: &str,
    history: &[Content],
    tools: &[ToolDeclaration],
    cfg: &LlmConfig,
) -> Value {
    let contents: Vec<Value> = history
        .iter()
        .map(|entry| match entry {
            Content::UserText(text) => json!({
                "role": "user",
                "parts": [{"text": text}]
            }),
            Content::ModelText(text) => json!({
                "role": "model",
                "parts": [{"text": text}]
            }),
            Content::ModelToolCalls(calls) => json!({
                "role": "model",
                "parts": calls
                    .iter()
                    .map(|c| json!({"functionCall": {"name": c.name, "args": c.arguments}}))
                    .collect::<Vec<_>>()
            }),
            Content::ToolResponses(responses) => json!({
                "role": "user",
                "parts": responses
                    .iter()
                    .map(|r| json!({
                        "functionResponse": {"name": r.name, "response": {"result": r.response}}
                    }))
                    .collect::<Vec<_>>()
            }),
        })
        .collect();

    let mut body = json!({
        "systemInstruction": {"parts": [{"text": system}]},
        "contents": contents,
        "generationConfig": {
            "temperature": cfg.temperature,
            "maxOutputTokens": cfg.max_output_tokens,
        },
    });

    if !tools.is_empty() {
        body["tools"] = json!([{
            "functionDeclarations": tools
                .iter()
                .map(|t| json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                }))
                .collect::<Vec<_>>()
        }]);
    }

    body
}

/// Extract assistant text, function calls, and token usage from a
/// generateContent response.
pub fn parse_generate_response(v: &Value) -> Result<ModelTurn> {
    let usage = TokenUsage {
        prompt_tokens: v
            .pointer("/usageMetadata/promptTokenCount")
            .and_then(|x| x.as_u64())
            .unwrap_or(0),
        completion_tokens: v
            .pointer("/usageMetadata/candidatesTokenCount")
            .and_then(|x| x.as_u64())
            .unwrap_or(0),
    };

    let parts = v
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            AlertlineError::LlmError("Missing candidates[0].content.parts in response".to_string())
        })?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in parts {
        if let Some(t) = part.get("text").and_then(|x| x.as_str()) {
            text.push_str(t);
        }
        if let Some(fc) = part.get("functionCall") {
            let name = fc
                .get("name")
                .and_then(|x| x.as_str())
                .unwrap_or_default()
                .to_string();
            let arguments = fc.get("args").cloned().unwrap_or_else(|| json!({}));
            tool_calls.push(ToolCall { name, arguments });
        }
    }

    Ok(ModelTurn {
        text: if text.is_empty() { None } else { Some(text) },
        tool_calls,
        usage,
    })
}

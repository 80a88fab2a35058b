//! Language-model turns via Google's hosted Gemini API, with function
//! calling over the tool registry.

mod client;

pub use client::{build_generate_body, parse_generate_response, GeminiClient, LlmConfig};

use crate::tools::ToolRegistry;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

/// A tool result handed back to the model on the next round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResponse {
    pub name: String,
    pub response: Value,
}

/// One entry of conversation history, in pipeline order.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    UserText(String),
    ModelText(String),
    ModelToolCalls(Vec<ToolCall>),
    ToolResponses(Vec<ToolResponse>),
}

/// Token accounting reported by the provider for one generate call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// What the model produced for one round: assistant text, function calls,
/// or both (some models narrate while calling).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
}

/// A tool surfaced to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Build the model-facing declarations for every registered tool.
pub fn declarations_from_registry(registry: &ToolRegistry) -> Vec<ToolDeclaration> {
    registry
        .list()
        .iter()
        .map(|t| ToolDeclaration {
            name: t.name(),
            description: t.description(),
            parameters: t.parameters(),
        })
        .collect()
}

/// Seam over the hosted generate call.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        history: &[Content],
        tools: &[ToolDeclaration],
    ) -> Result<ModelTurn>;
}

//! Per-call conversational pipeline state: policy, history, providers, tools.

use crate::llm::{declarations_from_registry, Content, LanguageModel, ToolDeclaration, ToolResponse};
use crate::metrics::UsageCollector;
use crate::stt::SpeechToText;
use crate::tools::ToolRegistry;
use crate::tts::{SpeechAudio, TextToSpeech};
use crate::{AlertlineError, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Upper bound on dispatch-and-refine rounds within one caller turn.
const MAX_TOOL_ROUNDS: usize = 4;

/// What one caller turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub text: String,
    pub audio: Option<SpeechAudio>,
}

/// One inbound call's session: the policy instructions, the running
/// conversation, the provider handles, and the tools the model may invoke.
pub struct CallSession {
    instructions: String,
    greeting: String,
    history: Vec<Content>,
    llm: Arc<dyn LanguageModel>,
    stt: Option<Arc<dyn SpeechToText>>,
    tts: Option<Arc<dyn TextToSpeech>>,
    registry: Arc<ToolRegistry>,
    usage: Arc<UsageCollector>,
    tools: Vec<ToolDeclaration>,
}

impl CallSession {
    pub fn new(
        instructions: impl Into<String>,
        greeting: impl Into<String>,
        llm: Arc<dyn LanguageModel>,
        registry: Arc<ToolRegistry>,
        usage: Arc<UsageCollector>,
    ) -> Self {
        let tools = declarations_from_registry(&registry);
        Self {
            instructions: instructions.into(),
            greeting: greeting.into(),
            history: Vec::new(),
            llm,
            stt: None,
            tts: None,
            registry,
            usage,
            tools,
        }
    }

    pub fn with_stt(mut self, stt: Arc<dyn SpeechToText>) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn with_tts(mut self, tts: Arc<dyn TextToSpeech>) -> Self {
        self.tts = Some(tts);
        self
    }

    /// Opening line. The agent speaks first on connect, and the line is part
    /// of the history the model sees afterwards.
    pub fn greeting(&mut self) -> String {
        let line = self.greeting.clone();
        self.history.push(Content::ModelText(line.clone()));
        line
    }

    /// Drive one caller turn: append the utterance, let the model call tools
    /// until it settles on a reply, and return the reply text.
    pub async fn handle_utterance(&mut self, text: &str) -> Result<String> {
        self.usage.record_turn().await;
        self.history.push(Content::UserText(text.to_string()));

        for _ in 0..MAX_TOOL_ROUNDS {
            let turn = self
                .llm
                .generate(&self.instructions, &self.history, &self.tools)
                .await?;
            self.usage.record_llm_usage(turn.usage).await;

            if turn.tool_calls.is_empty() {
                let reply = turn.text.unwrap_or_default();
                self.history.push(Content::ModelText(reply.clone()));
                return Ok(reply);
            }

            // Dispatch every requested call, then hand the results back for
            // the model to refine its answer on the next round.
            self.history
                .push(Content::ModelToolCalls(turn.tool_calls.clone()));
            let mut responses = Vec::with_capacity(turn.tool_calls.len());
            for call in &turn.tool_calls {
                self.usage.record_tool_call().await;
                let response = match self.registry.call(&call.name, call.arguments.clone()).await {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(target: "session", tool = %call.name, error = %e, "Tool call failed");
                        json!({"error": e.to_string()})
                    }
                };
                responses.push(ToolResponse {
                    name: call.name.clone(),
                    response,
                });
            }
            self.history.push(Content::ToolResponses(responses));
        }

        Err(AlertlineError::SessionError(format!(
            "Model did not settle on a reply within {MAX_TOOL_ROUNDS} tool rounds"
        )))
    }

    /// Full audio turn: transcribe, converse, synthesize.
    pub async fn handle_audio(&mut self, audio: Vec<u8>, mime: &str) -> Result<TurnOutput> {
        let stt = self.stt.clone().ok_or_else(|| {
            AlertlineError::SessionError("No speech-to-text provider attached".to_string())
        })?;

        let transcript = stt.transcribe(audio, mime).await?;
        self.usage.record_stt_audio(transcript.duration_secs).await;

        if transcript.text.trim().is_empty() {
            return Ok(TurnOutput {
                text: String::new(),
                audio: None,
            });
        }

        info!(target: "session", caller = %transcript.text, "Heard utterance");
        let reply = self.handle_utterance(&transcript.text).await?;
        Ok(self.speak(reply).await)
    }

    /// Synthesize a reply. A synthesis failure degrades to a text-only turn;
    /// the call must not die because one downstream provider hiccuped.
    pub async fn speak(&self, text: String) -> TurnOutput {
        let Some(tts) = &self.tts else {
            return TurnOutput { text, audio: None };
        };
        match tts.synthesize(&text).await {
            Ok(speech) => {
                self.usage.record_tts_characters(speech.characters).await;
                TurnOutput {
                    text,
                    audio: Some(speech),
                }
            }
            Err(e) => {
                error!(target: "session", error = %e, "Synthesis failed; continuing text-only");
                TurnOutput { text, audio: None }
            }
        }
    }
}

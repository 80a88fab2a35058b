//! End-to-end session tests with a scripted language model over a real
//! temp-file case store

use alertline_core::cases::{CaseStatus, CaseStore};
use alertline_core::llm::{Content, LanguageModel, ModelTurn, TokenUsage, ToolCall, ToolDeclaration};
use alertline_core::metrics::UsageCollector;
use alertline_core::session::CallSession;
use alertline_core::stt::{SpeechToText, Transcript};
use alertline_core::tools::{LoadFraudCaseTool, ToolRegistry, UpdateFraudCaseTool};
use alertline_core::tts::{SpeechAudio, TextToSpeech};
use alertline_core::{AlertlineError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::fs;

const SEED: &str = r#"[
  {
    "userName": "Jane Doe",
    "cardEnding": "4821",
    "transactionName": "LuxeTech Online Electronics",
    "transactionAmount": "$742.50",
    "case": "pending",
    "outcomeNote": "",
    "securityQuestion": "What is the name of your first pet?",
    "securityAnswer": "Biscuit"
  }
]"#;

/// Plays back a fixed sequence of model turns and records every history it
/// was shown.
struct ScriptedModel {
    turns: Mutex<VecDeque<ModelTurn>>,
    seen: Mutex<Vec<Vec<Content>>>,
}

impl ScriptedModel {
    fn new(turns: Vec<ModelTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn histories(&self) -> Vec<Vec<Content>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(
        &self,
        _system: &str,
        history: &[Content],
        _tools: &[ToolDeclaration],
    ) -> Result<ModelTurn> {
        self.seen.lock().unwrap().push(history.to_vec());
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AlertlineError::LlmError("script exhausted".to_string()))
    }
}

struct FakeStt {
    text: String,
    duration_secs: f64,
}

#[async_trait]
impl SpeechToText for FakeStt {
    async fn transcribe(&self, _audio: Vec<u8>, _mime: &str) -> Result<Transcript> {
        Ok(Transcript {
            text: self.text.clone(),
            confidence: 0.94,
            duration_secs: self.duration_secs,
        })
    }
}

struct FakeTts;

#[async_trait]
impl TextToSpeech for FakeTts {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        Ok(SpeechAudio {
            audio: vec![0x52, 0x49, 0x46, 0x46],
            format: "WAV".to_string(),
            duration_secs: 1.2,
            characters: text.chars().count() as u64,
        })
    }
}

struct FailingTts;

#[async_trait]
impl TextToSpeech for FailingTts {
    async fn synthesize(&self, _text: &str) -> Result<SpeechAudio> {
        Err(AlertlineError::TtsError("synthesis backend down".to_string()))
    }
}

fn tool_turn(name: &str, arguments: serde_json::Value) -> ModelTurn {
    ModelTurn {
        text: None,
        tool_calls: vec![ToolCall {
            name: name.to_string(),
            arguments,
        }],
        usage: TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
        },
    }
}

fn text_turn(text: &str) -> ModelTurn {
    ModelTurn {
        text: Some(text.to_string()),
        tool_calls: vec![],
        usage: TokenUsage {
            prompt_tokens: 20,
            completion_tokens: 7,
        },
    }
}

async fn seeded_registry(dir: &TempDir) -> (Arc<CaseStore>, Arc<ToolRegistry>) {
    let path = dir.path().join("fraud_cases.json");
    fs::write(&path, SEED).await.unwrap();
    let store = Arc::new(CaseStore::new(path));
    let registry = Arc::new(ToolRegistry::new());
    registry.register(Arc::new(LoadFraudCaseTool::new(Arc::clone(&store))));
    registry.register(Arc::new(UpdateFraudCaseTool::new(Arc::clone(&store))));
    (store, registry)
}

#[tokio::test]
async fn test_tool_loop_loads_case_and_replies() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, registry) = seeded_registry(&dir).await;

    let model = Arc::new(ScriptedModel::new(vec![
        tool_turn("load_fraud_case", json!({"user_name": "jane doe"})),
        text_turn("Thanks Jane, I found your case. Before we continue, what is the name of your first pet?"),
    ]));
    let usage = Arc::new(UsageCollector::new());
    let mut session = CallSession::new(
        "You are a fraud alert agent.",
        "Hello, this is SecureBank's fraud department.",
        Arc::clone(&model) as Arc<dyn LanguageModel>,
        registry,
        Arc::clone(&usage),
    );

    let opening = session.greeting();
    assert!(opening.contains("fraud department"));

    let reply = session
        .handle_utterance("Hi, this is Jane Doe")
        .await
        .unwrap();
    assert!(reply.contains("first pet"));

    // The model saw the greeting, the caller turn, and then its own tool
    // call with the store's record handed back
    let histories = model.histories();
    assert_eq!(histories.len(), 2);
    assert_eq!(
        histories[0],
        vec![
            Content::ModelText("Hello, this is SecureBank's fraud department.".to_string()),
            Content::UserText("Hi, this is Jane Doe".to_string()),
        ]
    );
    let Content::ToolResponses(responses) = &histories[1][3] else {
        panic!("expected tool responses in round two");
    };
    assert_eq!(responses[0].name, "load_fraud_case");
    assert_eq!(responses[0].response["userName"], "Jane Doe");

    let summary = usage.summary().await;
    assert_eq!(summary.turns, 1);
    assert_eq!(summary.tool_calls, 1);
    assert_eq!(summary.llm_prompt_tokens, 30);
    assert_eq!(summary.llm_completion_tokens, 12);
}

#[tokio::test]
async fn test_tool_loop_update_persists_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let (store, registry) = seeded_registry(&dir).await;

    let model = Arc::new(ScriptedModel::new(vec![
        tool_turn(
            "update_fraud_case",
            json!({
                "user_name": "Jane Doe",
                "status": "confirmed_fraud",
                "outcome_note": "Customer denied transaction"
            }),
        ),
        text_turn("I've marked that charge as fraudulent and blocked the card."),
    ]));
    let usage = Arc::new(UsageCollector::new());
    let mut session = CallSession::new(
        "You are a fraud alert agent.",
        "Hello.",
        model as Arc<dyn LanguageModel>,
        registry,
        usage,
    );

    let reply = session
        .handle_utterance("No, I never made that purchase")
        .await
        .unwrap();
    assert!(reply.contains("fraudulent"));

    let case = store.load("jane doe").await.unwrap().unwrap();
    assert_eq!(case.status, CaseStatus::ConfirmedFraud);
    assert_eq!(case.outcome_note, "Customer denied transaction");
}

#[tokio::test]
async fn test_runaway_tool_calls_end_the_turn() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, registry) = seeded_registry(&dir).await;

    // A model that never stops calling tools must not loop forever
    let script: Vec<ModelTurn> = (0..6)
        .map(|_| tool_turn("load_fraud_case", json!({"user_name": "Jane Doe"})))
        .collect();
    let model = Arc::new(ScriptedModel::new(script));
    let usage = Arc::new(UsageCollector::new());
    let mut session = CallSession::new(
        "You are a fraud alert agent.",
        "Hello.",
        model as Arc<dyn LanguageModel>,
        registry,
        usage,
    );

    let err = session.handle_utterance("Hello?").await.unwrap_err();
    assert!(matches!(err, AlertlineError::SessionError(_)));
}

#[tokio::test]
async fn test_failed_tool_call_is_reported_to_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, registry) = seeded_registry(&dir).await;

    let model = Arc::new(ScriptedModel::new(vec![
        // Bad status: the tool rejects it and the error goes back to the model
        tool_turn(
            "update_fraud_case",
            json!({"user_name": "Jane Doe", "status": "maybe", "outcome_note": "x"}),
        ),
        text_turn("Let me try that again."),
    ]));
    let usage = Arc::new(UsageCollector::new());
    let mut session = CallSession::new(
        "You are a fraud alert agent.",
        "Hello.",
        Arc::clone(&model) as Arc<dyn LanguageModel>,
        registry,
        usage,
    );

    let reply = session.handle_utterance("It was not me").await.unwrap();
    assert_eq!(reply, "Let me try that again.");

    let histories = model.histories();
    let Content::ToolResponses(responses) = &histories[1][2] else {
        panic!("expected tool responses in round two");
    };
    assert!(responses[0].response["error"]
        .as_str()
        .unwrap()
        .contains("Invalid arguments"));
}

#[tokio::test]
async fn test_audio_turn_runs_the_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, registry) = seeded_registry(&dir).await;

    let model = Arc::new(ScriptedModel::new(vec![text_turn(
        "Could you give me your name, please?",
    )]));
    let usage = Arc::new(UsageCollector::new());
    let mut session = CallSession::new(
        "You are a fraud alert agent.",
        "Hello.",
        model as Arc<dyn LanguageModel>,
        registry,
        Arc::clone(&usage),
    )
    .with_stt(Arc::new(FakeStt {
        text: "Hi, who is this?".to_string(),
        duration_secs: 2.5,
    }))
    .with_tts(Arc::new(FakeTts));

    let turn = session
        .handle_audio(vec![0u8; 320], "audio/wav")
        .await
        .unwrap();
    assert_eq!(turn.text, "Could you give me your name, please?");
    let audio = turn.audio.expect("reply should be synthesized");
    assert_eq!(audio.format, "WAV");

    let summary = usage.summary().await;
    assert_eq!(summary.turns, 1);
    assert!((summary.stt_audio_secs - 2.5).abs() < f64::EPSILON);
    assert_eq!(summary.tts_characters, turn.text.chars().count() as u64);
}

#[tokio::test]
async fn test_silent_audio_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, registry) = seeded_registry(&dir).await;

    let model = Arc::new(ScriptedModel::new(vec![]));
    let usage = Arc::new(UsageCollector::new());
    let mut session = CallSession::new(
        "You are a fraud alert agent.",
        "Hello.",
        model as Arc<dyn LanguageModel>,
        registry,
        Arc::clone(&usage),
    )
    .with_stt(Arc::new(FakeStt {
        text: "   ".to_string(),
        duration_secs: 0.8,
    }));

    let turn = session.handle_audio(vec![0u8; 320], "audio/wav").await.unwrap();
    assert!(turn.text.is_empty());
    assert!(turn.audio.is_none());

    // Silence still counts toward transcribed audio, but not as a turn
    let summary = usage.summary().await;
    assert_eq!(summary.turns, 0);
    assert!((summary.stt_audio_secs - 0.8).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_synthesis_failure_degrades_to_text_only() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, registry) = seeded_registry(&dir).await;

    let model = Arc::new(ScriptedModel::new(vec![text_turn("Bear with me.")]));
    let usage = Arc::new(UsageCollector::new());
    let mut session = CallSession::new(
        "You are a fraud alert agent.",
        "Hello.",
        model as Arc<dyn LanguageModel>,
        registry,
        Arc::clone(&usage),
    )
    .with_stt(Arc::new(FakeStt {
        text: "Hello?".to_string(),
        duration_secs: 1.0,
    }))
    .with_tts(Arc::new(FailingTts));

    let turn = session.handle_audio(vec![0u8; 320], "audio/wav").await.unwrap();
    assert_eq!(turn.text, "Bear with me.");
    assert!(turn.audio.is_none(), "turn degrades to text when synthesis fails");
    assert_eq!(usage.summary().await.tts_characters, 0);
}

// Alertline Core Library
// Fraud-alert voice agent: case store, tools, and pipeline providers

pub mod cases;
pub mod llm;
pub mod metrics;
pub mod session;
pub mod stt;
pub mod tools;
pub mod tts;

// Export core types
pub use cases::{CaseStatus, CaseStore, FraudCase, StoreError, UpdateOutcome};
pub use llm::{GeminiClient, LanguageModel, ModelTurn};
pub use metrics::{UsageCollector, UsageSummary};
pub use session::{CallSession, TurnOutput};
pub use stt::{DeepgramStt, SpeechToText, Transcript};
pub use tools::{LoadFraudCaseTool, Tool, ToolError, ToolRegistry, ToolResult, UpdateFraudCaseTool};
pub use tts::{MurfTts, SpeechAudio, TextToSpeech};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertlineError {
    #[error("Store error: {0}")]
    StoreError(#[from] cases::StoreError),

    #[error("Speech-to-text error: {0}")]
    SttError(String),

    #[error("Language model error: {0}")]
    LlmError(String),

    #[error("Text-to-speech error: {0}")]
    TtsError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, AlertlineError>;

use super::error::ToolResult;
use async_trait::async_trait;
use serde_json::Value;

/// A callable the conversational model may invoke during a dialogue turn.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name the model calls the tool by (e.g. "load_fraud_case")
    fn name(&self) -> String;

    /// What the tool does, surfaced to the model alongside the schema
    fn description(&self) -> String;

    /// The JSON Schema for the tool's arguments
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments
    async fn call(&self, arguments: Value) -> ToolResult<Value>;
}

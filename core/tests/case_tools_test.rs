//! Unit tests for the two case tools and their registry dispatch

use alertline_core::cases::{CaseStatus, CaseStore};
use alertline_core::tools::{LoadFraudCaseTool, Tool, ToolError, ToolRegistry, UpdateFraudCaseTool};
use serde_json::{json, Value};
use std::sync::Arc;
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

async fn seeded_store(dir: &TempDir) -> Arc<CaseStore> {
    let path = dir.path().join("fraud_cases.json");
    fs::write(&path, SEED).await.unwrap();
    Arc::new(CaseStore::new(path))
}

#[tokio::test]
async fn test_load_tool_returns_case() {
    let dir = tempfile::tempdir().unwrap();
    let tool = LoadFraudCaseTool::new(seeded_store(&dir).await);

    let value = tool.call(json!({"user_name": "jane doe"})).await.unwrap();
    assert_eq!(value["userName"], "Jane Doe");
    assert_eq!(value["cardEnding"], "4821");
    assert_eq!(value["case"], "pending");
    assert_eq!(value["securityQuestion"], "What is the name of your first pet?");
}

#[tokio::test]
async fn test_load_tool_absent_returns_null() {
    let dir = tempfile::tempdir().unwrap();
    let tool = LoadFraudCaseTool::new(seeded_store(&dir).await);

    let value = tool.call(json!({"user_name": "Nobody Known"})).await.unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_load_tool_degrades_storage_failure_to_null() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(CaseStore::new(dir.path().join("no_such_file.json")));
    let tool = LoadFraudCaseTool::new(store);

    // Lookup never raises past the tool boundary
    let value = tool.call(json!({"user_name": "Jane Doe"})).await.unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_load_tool_missing_argument() {
    let dir = tempfile::tempdir().unwrap();
    let tool = LoadFraudCaseTool::new(seeded_store(&dir).await);

    let err = tool.call(json!({})).await.unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments(_)));
}

#[tokio::test]
async fn test_update_tool_confirms_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir).await;
    let tool = UpdateFraudCaseTool::new(Arc::clone(&store));

    let value = tool
        .call(json!({
            "user_name": "jane doe",
            "status": "confirmed_fraud",
            "outcome_note": "Customer denied transaction"
        }))
        .await
        .unwrap();
    assert_eq!(
        value,
        json!("Fraud case for jane doe updated to confirmed_fraud. Note: Customer denied transaction")
    );

    // A lookup with the canonical spelling sees the new values
    let case = store.load("Jane Doe").await.unwrap().unwrap();
    assert_eq!(case.status, CaseStatus::ConfirmedFraud);
    assert_eq!(case.outcome_note, "Customer denied transaction");
}

#[tokio::test]
async fn test_update_tool_absent_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir).await;
    let tool = UpdateFraudCaseTool::new(Arc::clone(&store));
    let before = fs::read(store.path()).await.unwrap();

    let value = tool
        .call(json!({
            "user_name": "Nobody Known",
            "status": "confirmed_safe",
            "outcome_note": "n/a"
        }))
        .await
        .unwrap();
    assert_eq!(value, json!("Could not find fraud case for Nobody Known"));

    let after = fs::read(store.path()).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_update_tool_rejects_unknown_status() {
    let dir = tempfile::tempdir().unwrap();
    let tool = UpdateFraudCaseTool::new(seeded_store(&dir).await);

    let err = tool
        .call(json!({
            "user_name": "Jane Doe",
            "status": "definitely_fine",
            "outcome_note": "n/a"
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments(_)));
}

#[tokio::test]
async fn test_update_tool_reports_storage_failure_as_string() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fraud_cases.json");
    fs::write(&path, "{ not json ]").await.unwrap();
    let tool = UpdateFraudCaseTool::new(Arc::new(CaseStore::new(path)));

    let value = tool
        .call(json!({
            "user_name": "Jane Doe",
            "status": "confirmed_safe",
            "outcome_note": "n/a"
        }))
        .await
        .unwrap();
    let message = value.as_str().unwrap();
    assert!(
        message.starts_with("Error updating fraud case:"),
        "got: {message}"
    );
}

#[tokio::test]
async fn test_registry_dispatches_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir).await;
    let registry = ToolRegistry::new();
    registry.register(Arc::new(LoadFraudCaseTool::new(Arc::clone(&store))));
    registry.register(Arc::new(UpdateFraudCaseTool::new(Arc::clone(&store))));

    assert_eq!(registry.list().len(), 2);

    let value = registry
        .call("load_fraud_case", json!({"user_name": "Jane Doe"}))
        .await
        .unwrap();
    assert_eq!(value["userName"], "Jane Doe");

    let err = registry.call("close_account", json!({})).await.unwrap_err();
    assert!(matches!(err, ToolError::NotFound(_)));
}

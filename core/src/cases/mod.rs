//! Fraud-case records and the file-backed store behind the agent's tools.

mod store;

pub use store::{CaseStore, StoreError, UpdateOutcome};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Resolution state of a fraud case.
///
/// `Pending` is the state a case is created in; the other three are the
/// terminal outcomes a call can reach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Pending,
    ConfirmedSafe,
    ConfirmedFraud,
    VerificationFailed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::ConfirmedSafe => "confirmed_safe",
            CaseStatus::ConfirmedFraud => "confirmed_fraud",
            CaseStatus::VerificationFailed => "verification_failed",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("unknown case status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for CaseStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CaseStatus::Pending),
            "confirmed_safe" => Ok(CaseStatus::ConfirmedSafe),
            "confirmed_fraud" => Ok(CaseStatus::ConfirmedFraud),
            "verification_failed" => Ok(CaseStatus::VerificationFailed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One flagged transaction for one customer.
///
/// Field names on the wire are the collection file's camelCase names.
/// Fields this crate does not model (the collection is not schema-enforced)
/// ride along in `extra` and survive read-modify-write untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudCase {
    /// Case-insensitive lookup key within the collection.
    pub user_name: String,
    /// Last digits of the card, display-only.
    pub card_ending: String,
    pub transaction_name: String,
    pub transaction_amount: String,
    #[serde(rename = "case", default)]
    pub status: CaseStatus,
    #[serde(default)]
    pub outcome_note: String,
    /// Caller-verification question, present in source data when used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_answer: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FraudCase {
    /// Case-insensitive key match, the only uniqueness the store relies on.
    pub fn matches_user(&self, user_name: &str) -> bool {
        self.user_name.to_lowercase() == user_name.to_lowercase()
    }
}

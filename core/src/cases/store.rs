use super::{CaseStatus, FraudCase};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access case file: {0}")]
    Io(#[from] std::io::Error),

    #[error("case file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of an update attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The record after mutation, already persisted.
    Updated(FraudCase),
    /// No record matched; nothing was written.
    NotFound,
}

/// Durable mapping from customer name to a mutable fraud case, backed by one
/// JSON collection file.
///
/// The whole collection is re-read on every operation and rewritten wholesale
/// on every successful update; there is no caching across calls. All access
/// goes through this one object's gate, which serializes reads against
/// read-modify-write cycles within the process. Call volume is one lookup and
/// one update per phone call; this is not a design for concurrent or
/// high-volume use.
pub struct CaseStore {
    path: PathBuf,
    gate: Mutex<()>,
}

impl CaseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!(target: "case_store", path = %path.display(), "Opening case store");
        Self {
            path,
            gate: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the first record whose `userName` matches `user_name`
    /// case-insensitively, or `None` when no record matches.
    ///
    /// Duplicate names are not rejected on write; first match in sequence
    /// order wins, for this and for [`CaseStore::update`].
    pub async fn load(&self, user_name: &str) -> Result<Option<FraudCase>, StoreError> {
        let _guard = self.gate.lock().await;
        let cases = self.read_all_unlocked().await?;
        debug!(target: "case_store", user = %user_name, total = cases.len(), "Scanning cases");
        Ok(cases.into_iter().find(|c| c.matches_user(user_name)))
    }

    /// Set the first matching record's status and outcome note, then rewrite
    /// the whole collection. When no record matches, nothing is written.
    pub async fn update(
        &self,
        user_name: &str,
        status: CaseStatus,
        outcome_note: &str,
    ) -> Result<UpdateOutcome, StoreError> {
        let _guard = self.gate.lock().await;
        let mut cases = self.read_all_unlocked().await?;

        let Some(case) = cases.iter_mut().find(|c| c.matches_user(user_name)) else {
            debug!(target: "case_store", user = %user_name, "No case to update");
            return Ok(UpdateOutcome::NotFound);
        };

        case.status = status;
        case.outcome_note = outcome_note.to_string();
        let updated = case.clone();

        self.write_all_unlocked(&cases).await?;
        info!(
            target: "case_store",
            user = %updated.user_name,
            status = %status,
            "Case updated"
        );
        Ok(UpdateOutcome::Updated(updated))
    }

    /// Read the full collection in sequence order.
    pub async fn read_all(&self) -> Result<Vec<FraudCase>, StoreError> {
        let _guard = self.gate.lock().await;
        self.read_all_unlocked().await
    }

    /// Replace the full collection.
    pub async fn write_all(&self, cases: &[FraudCase]) -> Result<(), StoreError> {
        let _guard = self.gate.lock().await;
        self.write_all_unlocked(cases).await
    }

    async fn read_all_unlocked(&self) -> Result<Vec<FraudCase>, StoreError> {
        let bytes = fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_all_unlocked(&self, cases: &[FraudCase]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(cases)?;
        // Snapshot-and-rename: a crash mid-write must not truncate the
        // collection, so the new content lands in a sibling file first.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

//! Results of earlier pipeline stages
//!
//! A record-creating stage runs before the attach finisher and reports the
//! uids it inserted. Deferred options such as
//! `{SaveToDatabase.insertedUids.0}` are resolved against these results
//! before the finisher runs.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageResults {
    inserted_uids: HashMap<String, Vec<i64>>,
}

impl StageResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inserted_uid(mut self, stage: impl Into<String>, uid: i64) -> Self {
        self.record_inserted_uid(stage, uid);
        self
    }

    /// Append a uid inserted by `stage`; its index is the number recorded before it.
    pub fn record_inserted_uid(&mut self, stage: impl Into<String>, uid: i64) {
        self.inserted_uids.entry(stage.into()).or_default().push(uid);
    }

    pub fn inserted_uid(&self, stage: &str, index: usize) -> Option<i64> {
        self.inserted_uids.get(stage)?.get(index).copied()
    }

    /// Parse a `STAGE=UID` assignment, e.g. from the command line.
    pub fn record_assignment(&mut self, assignment: &str) -> Result<(), String> {
        let (stage, uid) = assignment
            .rsplit_once('=')
            .ok_or_else(|| format!("expected STAGE=UID, got '{}'", assignment))?;
        let stage = stage.trim();
        if stage.is_empty() {
            return Err(format!("missing stage name in '{}'", assignment));
        }
        let uid = uid
            .trim()
            .parse()
            .map_err(|e| format!("invalid uid in '{}': {}", assignment, e))?;
        self.record_inserted_uid(stage, uid);
        Ok(())
    }
}

//! In-memory record store
//!
//! Keeps inserted rows per table in insertion order. Owning records are
//! seeded with [`MemoryStore::with_record`]. Failure injection lets callers
//! reproduce partially applied writes.

use super::references::{LinkRow, FILE_REFERENCE_TABLE};
use super::traits::{ColumnValue, MatchPredicate, RecordStore, Row, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<Row>>,
    inserts: usize,
    updates: usize,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    /// Reject every insert after this many succeeded
    insert_budget: Option<usize>,
    fail_updates: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an owning record with only a `uid` column.
    pub fn with_record(self, table: &str, uid: i64) -> Self {
        let mut row = Row::new();
        row.insert("uid".into(), ColumnValue::Int(uid));
        self.state
            .lock()
            .unwrap()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
        self
    }

    pub fn fail_inserts_after(mut self, succeeded: usize) -> Self {
        self.insert_budget = Some(succeeded);
        self
    }

    pub fn fail_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    /// All rows of `table`, in insertion order
    pub fn rows(&self, table: &str) -> Vec<Row> {
        let state = self.state.lock().unwrap();
        state.tables.get(table).cloned().unwrap_or_default()
    }

    /// Link rows written so far, in insertion order
    pub fn file_references(&self) -> Vec<LinkRow> {
        self.rows(FILE_REFERENCE_TABLE)
            .iter()
            .filter_map(LinkRow::from_row)
            .collect()
    }

    /// The owning record with the given uid
    pub fn record(&self, table: &str, uid: i64) -> Option<Row> {
        let predicate = MatchPredicate::uid(uid);
        self.rows(table).into_iter().find(|row| predicate.matches(row))
    }

    /// Number of successful inserts
    pub fn insert_count(&self) -> usize {
        self.state.lock().unwrap().inserts
    }

    /// Number of update statements applied
    pub fn update_count(&self) -> usize {
        self.state.lock().unwrap().updates
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, table: &str, row: &Row) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(budget) = self.insert_budget {
            if state.inserts >= budget {
                return Err(StorageError::InsertRejected {
                    table: table.to_string(),
                    reason: "injected failure".to_string(),
                });
            }
        }
        state.tables.entry(table.to_string()).or_default().push(row.clone());
        state.inserts += 1;
        Ok(())
    }

    fn update(&self, table: &str, columns: &Row, predicate: &MatchPredicate) -> StorageResult<usize> {
        if self.fail_updates {
            return Err(StorageError::UpdateRejected {
                table: table.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        let mut affected = 0;
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| predicate.matches(row)) {
                for (column, value) in columns {
                    row.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
        }
        state.updates += 1;
        Ok(affected)
    }
}

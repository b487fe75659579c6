//! File reference link rows and per-field count synchronization

use super::traits::{ColumnValue, MatchPredicate, RecordStore, Row, StorageResult};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// Join table holding one row per (owning record, field, file)
pub const FILE_REFERENCE_TABLE: &str = "sys_file_reference";

/// Target column name to ordered file uids.
///
/// Insertion order is meaningful: it is the order fields are written in.
pub type FieldMapping = IndexMap<String, Vec<i64>>;

/// One file reference link row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRow {
    /// Storage location (page/folder) the reference lives in
    pub location_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    /// Uid of the referenced file
    pub source_identifier: i64,
    pub target_table: String,
    pub target_record_id: i64,
    pub target_field: String,
    /// 0-based position within the field's list
    pub rank: i64,
}

impl LinkRow {
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("pid".into(), ColumnValue::Int(self.location_id));
        row.insert("tstamp".into(), ColumnValue::Int(self.updated_at));
        row.insert("crdate".into(), ColumnValue::Int(self.created_at));
        row.insert("uid_local".into(), ColumnValue::Int(self.source_identifier));
        row.insert("uid_foreign".into(), ColumnValue::Int(self.target_record_id));
        row.insert("tablenames".into(), ColumnValue::Text(self.target_table.clone()));
        row.insert("fieldname".into(), ColumnValue::Text(self.target_field.clone()));
        row.insert("sorting_foreign".into(), ColumnValue::Int(self.rank));
        row
    }

    /// Inverse of [`LinkRow::to_row`]; `None` if a column is missing or mistyped.
    pub fn from_row(row: &Row) -> Option<Self> {
        let int = |col: &str| row.get(col).and_then(ColumnValue::as_int);
        let text = |col: &str| row.get(col).and_then(ColumnValue::as_text).map(str::to_string);
        Some(Self {
            location_id: int("pid")?,
            created_at: int("crdate")?,
            updated_at: int("tstamp")?,
            source_identifier: int("uid_local")?,
            target_table: text("tablenames")?,
            target_record_id: int("uid_foreign")?,
            target_field: text("fieldname")?,
            rank: int("sorting_foreign")?,
        })
    }
}

/// Insert one link row per (field, file uid) pair.
///
/// Fields are written in mapping order, uids in list order, each field's
/// ranks starting at 0. Nothing is read or deleted first, so calling this
/// twice duplicates rows. The first failing insert aborts the batch; rows
/// already inserted stay.
pub fn write_file_references(
    store: &dyn RecordStore,
    location_id: i64,
    table: &str,
    record_uid: i64,
    mapping: &FieldMapping,
) -> StorageResult<usize> {
    let mut written = 0;
    for (field, file_uids) in mapping {
        for (rank, file_uid) in file_uids.iter().enumerate() {
            let now = chrono::Utc::now().timestamp();
            let link = LinkRow {
                location_id,
                created_at: now,
                updated_at: now,
                source_identifier: *file_uid,
                target_table: table.to_string(),
                target_record_id: record_uid,
                target_field: field.clone(),
                rank: rank as i64,
            };
            trace!(field = %field, file_uid, rank, "insert file reference");
            store.insert(FILE_REFERENCE_TABLE, &link.to_row())?;
            written += 1;
        }
    }
    debug!(table, record_uid, written, "file references written");
    Ok(written)
}

/// Set each mapped field's column on the owning record to its file count.
///
/// One update for all fields. Counts are assigned, not added, so repeating
/// the call leaves the same values. An empty mapping issues no update.
pub fn sync_file_counts(
    store: &dyn RecordStore,
    table: &str,
    record_uid: i64,
    mapping: &FieldMapping,
) -> StorageResult<()> {
    if mapping.is_empty() {
        return Ok(());
    }

    let columns: Row = mapping
        .iter()
        .map(|(field, file_uids)| (field.clone(), ColumnValue::from(file_uids.len())))
        .collect();

    let affected = store.update(table, &columns, &MatchPredicate::uid(record_uid))?;
    debug!(table, record_uid, fields = columns.len(), affected, "file counts synchronized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn mapping(entries: &[(&str, Vec<i64>)]) -> FieldMapping {
        entries
            .iter()
            .map(|(field, uids)| (field.to_string(), uids.clone()))
            .collect()
    }

    #[test]
    fn test_link_row_round_trips_through_row() {
        let link = LinkRow {
            location_id: 3,
            created_at: 100,
            updated_at: 100,
            source_identifier: 42,
            target_table: "tx_item".into(),
            target_record_id: 9,
            target_field: "images".into(),
            rank: 1,
        };
        let row = link.to_row();
        assert_eq!(row.get("uid_local"), Some(&ColumnValue::Int(42)));
        assert_eq!(row.get("sorting_foreign"), Some(&ColumnValue::Int(1)));
        assert_eq!(LinkRow::from_row(&row), Some(link));
    }

    #[test]
    fn test_write_ranks_restart_per_field() {
        let store = MemoryStore::new();
        let written = write_file_references(
            &store,
            1,
            "tx_item",
            7,
            &mapping(&[("images", vec![10, 11]), ("files", vec![20])]),
        )
        .unwrap();
        assert_eq!(written, 3);

        let links = store.file_references();
        let summary: Vec<_> = links
            .iter()
            .map(|l| (l.target_field.as_str(), l.rank, l.source_identifier))
            .collect();
        assert_eq!(summary, vec![("images", 0, 10), ("images", 1, 11), ("files", 0, 20)]);
        assert!(links.iter().all(|l| l.location_id == 1
            && l.target_table == "tx_item"
            && l.target_record_id == 7
            && l.created_at == l.updated_at));
    }

    #[test]
    fn test_write_aborts_on_first_failure() {
        let store = MemoryStore::new().fail_inserts_after(1);
        let result = write_file_references(&store, 0, "tx_item", 7, &mapping(&[("images", vec![1, 2, 3])]));
        assert!(result.is_err());
        assert_eq!(store.file_references().len(), 1);
    }

    #[test]
    fn test_sync_sets_counts() {
        let store = MemoryStore::new().with_record("tx_item", 7);
        sync_file_counts(&store, "tx_item", 7, &mapping(&[("images", vec![10, 11]), ("files", vec![20])]))
            .unwrap();
        let record = store.record("tx_item", 7).unwrap();
        assert_eq!(record.get("images"), Some(&ColumnValue::Int(2)));
        assert_eq!(record.get("files"), Some(&ColumnValue::Int(1)));
    }

    #[test]
    fn test_sync_empty_mapping_skips_update() {
        let store = MemoryStore::new().with_record("tx_item", 7);
        sync_file_counts(&store, "tx_item", 7, &FieldMapping::new()).unwrap();
        assert_eq!(store.update_count(), 0);
    }

    #[test]
    fn test_sync_overwrites_previous_count() {
        let store = MemoryStore::new().with_record("tx_item", 7);
        sync_file_counts(&store, "tx_item", 7, &mapping(&[("images", vec![1, 2, 3])])).unwrap();
        sync_file_counts(&store, "tx_item", 7, &mapping(&[("images", vec![4])])).unwrap();
        let record = store.record("tx_item", 7).unwrap();
        assert_eq!(record.get("images"), Some(&ColumnValue::Int(1)));
    }
}

//! Storage backends for filelink
//!
//! Writes go through the `RecordStore` trait. `SqliteStore` is the
//! persistent implementation, `MemoryStore` an in-memory one for tests and
//! dry runs. `references` holds the link-row writer and count sync.

mod memory;
mod references;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use references::{
    sync_file_counts, write_file_references, FieldMapping, LinkRow, FILE_REFERENCE_TABLE,
};
pub use sqlite::SqliteStore;
pub use traits::{
    validate_identifier, ColumnValue, MatchPredicate, OpenStore, RecordStore, Row, StorageError,
    StorageResult,
};

//! filelink: attach form uploads to database records
//!
//! Links files uploaded through a form submission to a record that an
//! earlier pipeline stage created. Each uploaded file becomes one
//! `sys_file_reference` row pointing at the record, and the record gets the
//! number of linked files per field.
//!
//! # Core Concepts
//!
//! - **Finisher**: a stage run after the submission is accepted
//! - **Link row**: one `sys_file_reference` row per (field, file)
//! - **Rank**: the 0-based position of a file within its field
//!
//! # Example
//!
//! ```
//! use filelink::{
//!     AttachFilesToRecord, ElementMapping, Finisher, FinisherContext, FinisherOptions,
//!     FormDefinition, FormValues, MemoryStore, RecordUid, StageResults, UploadValue,
//! };
//!
//! let options = FinisherOptions::new("tx_item", RecordUid::parse("{SaveToDatabase.insertedUids.0}"))
//!     .with_element("images", ElementMapping::column("images"));
//! let stages = StageResults::new().with_inserted_uid("SaveToDatabase", 7);
//!
//! let form = FormDefinition::new().with_element("images", "MultiImageUpload");
//! let values = FormValues::new().with_value("images", UploadValue::collection([10, 11]));
//! let store = MemoryStore::new().with_record("tx_item", 7);
//!
//! let finisher = AttachFilesToRecord::new(options.resolve(&stages));
//! finisher.execute(&FinisherContext::new(&form, &values), &store).unwrap();
//! assert_eq!(store.file_references().len(), 2);
//! ```

pub mod config;
pub mod finisher;
mod form;
pub mod pipeline;
pub mod storage;

pub use config::{load_finisher_options, ConfigError, ConfigResult};
pub use finisher::{
    extract_file_uids, AttachFilesToRecord, ElementMapping, Finisher, FinisherContext,
    FinisherError, FinisherOptions, FinisherResult, RecordUid, ResolvedOptions,
};
pub use form::{ElementKind, ElementLookup, FileReference, FormDefinition, FormValues, UploadValue};
pub use pipeline::StageResults;
pub use storage::{
    sync_file_counts, write_file_references, ColumnValue, FieldMapping, LinkRow, MatchPredicate,
    MemoryStore, OpenStore, RecordStore, Row, SqliteStore, StorageError, StorageResult,
    FILE_REFERENCE_TABLE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

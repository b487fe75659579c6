//! AttachFilesToRecord — link uploaded files to a previously created record
//!
//! Runs after a stage that inserted the owning record. For every configured
//! upload element it collects the submitted file uids, inserts one
//! `sys_file_reference` row per file, and stores the per-field file count
//! on the owning record.

use super::extract::extract_file_uids;
use super::options::ResolvedOptions;
use super::{Finisher, FinisherContext, FinisherResult};
use crate::config::load_finisher_options;
use crate::pipeline::StageResults;
use crate::storage::{
    sync_file_counts, validate_identifier, write_file_references, FieldMapping, RecordStore,
};
use std::path::Path;
use tracing::{debug, info};

pub struct AttachFilesToRecord {
    options: ResolvedOptions,
}

impl AttachFilesToRecord {
    pub const IDENTIFIER: &'static str = "AttachFilesToRecord";

    pub fn new(options: ResolvedOptions) -> Self {
        Self { options }
    }

    /// Load options from a YAML finisher definition and resolve them
    /// against the results of earlier stages.
    pub fn from_config(path: impl AsRef<Path>, stages: &StageResults) -> FinisherResult<Self> {
        let options = load_finisher_options(path)?;
        Ok(Self::new(options.resolve(stages)))
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// Target column to ordered file uids for the current submission.
    ///
    /// Non-upload and unknown elements are skipped, as are fields without
    /// any file. When two elements map to the same column the later one
    /// replaces the earlier list, keeping the earlier position.
    pub fn collect_mappings(&self, context: &FinisherContext<'_>) -> FieldMapping {
        let mut mapping = FieldMapping::new();

        for (element, column) in &self.options.elements {
            let is_upload = context
                .form
                .element_kind(element)
                .is_some_and(|kind| kind.is_upload());
            if !is_upload {
                debug!(element = %element, "skipping non-upload element");
                continue;
            }

            let Some(value) = context.values.get(element) else {
                continue;
            };

            let file_uids = extract_file_uids(value);
            if !file_uids.is_empty() {
                mapping.insert(column.clone(), file_uids);
            }
        }

        mapping
    }
}

impl Finisher for AttachFilesToRecord {
    fn identifier(&self) -> &str {
        Self::IDENTIFIER
    }

    fn execute(
        &self,
        context: &FinisherContext<'_>,
        store: &dyn RecordStore,
    ) -> FinisherResult<Option<String>> {
        let ResolvedOptions {
            table,
            record_uid,
            storage_pid,
            ..
        } = &self.options;

        if !self.options.is_applicable() {
            debug!(table = %table, record_uid, "no record to attach files to");
            return Ok(None);
        }

        let mapping = self.collect_mappings(context);
        if mapping.is_empty() {
            debug!(table = %table, record_uid, "no uploaded files to attach");
            return Ok(None);
        }

        // Names the count update would reject must fail before any link row exists
        validate_identifier(table)?;
        for field in mapping.keys() {
            validate_identifier(field)?;
        }

        let written = write_file_references(store, *storage_pid, table, *record_uid, &mapping)?;
        sync_file_counts(store, table, *record_uid, &mapping)?;

        info!(
            table = %table,
            record_uid,
            fields = mapping.len(),
            references = written,
            "attached uploaded files"
        );
        Ok(None)
    }
}

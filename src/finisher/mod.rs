//! Finishers: stages run after a form submission has been accepted
//!
//! A finisher sees the submitted values and the form's element definitions,
//! writes through an injected [`RecordStore`], and may return output for
//! the response. Returning `Ok(None)` lets the pipeline continue.

mod attach;
mod extract;
mod options;

pub use attach::AttachFilesToRecord;
pub use extract::extract_file_uids;
pub use options::{ElementMapping, FinisherOptions, RecordUid, ResolvedOptions};

use crate::config::ConfigError;
use crate::form::{ElementLookup, FormValues};
use crate::storage::{RecordStore, StorageError};
use thiserror::Error;

/// Errors that can occur while running a finisher
#[derive(Debug, Error)]
pub enum FinisherError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for finisher operations
pub type FinisherResult<T> = Result<T, FinisherError>;

/// What a finisher can see of the submission
pub struct FinisherContext<'a> {
    pub form: &'a dyn ElementLookup,
    pub values: &'a FormValues,
}

impl<'a> FinisherContext<'a> {
    pub fn new(form: &'a dyn ElementLookup, values: &'a FormValues) -> Self {
        Self { form, values }
    }
}

/// The contract finishers implement.
pub trait Finisher {
    /// Identifier used in form definitions
    fn identifier(&self) -> &str;

    /// Run against the current submission.
    ///
    /// Storage failures propagate unchanged; nothing written before the
    /// failure is rolled back.
    fn execute(
        &self,
        context: &FinisherContext<'_>,
        store: &dyn RecordStore,
    ) -> FinisherResult<Option<String>>;
}

//! Loading finisher options from YAML form definitions
//!
//! Accepts either a form definition with a `finishers` list, picking the
//! first `AttachFilesToRecord` entry, or a bare options mapping.

use crate::finisher::{AttachFilesToRecord, FinisherOptions};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No {0} finisher defined")]
    MissingFinisher(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
struct FinisherDefinition {
    identifier: String,
    #[serde(default)]
    options: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct FormFinishers {
    #[serde(default)]
    finishers: Vec<FinisherDefinition>,
}

impl FinisherOptions {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let document: Value = serde_yaml::from_str(yaml)?;
        if document.get("finishers").is_none() {
            return Ok(serde_yaml::from_value(document)?);
        }

        let form: FormFinishers = serde_yaml::from_value(document)?;
        let definition = form
            .finishers
            .into_iter()
            .find(|f| f.identifier == AttachFilesToRecord::IDENTIFIER)
            .ok_or_else(|| ConfigError::MissingFinisher(AttachFilesToRecord::IDENTIFIER.to_string()))?;

        let options = definition
            .options
            .unwrap_or_else(|| Value::Mapping(Default::default()));
        Ok(serde_yaml::from_value(options)?)
    }
}

/// Read finisher options from a YAML file
pub fn load_finisher_options(path: impl AsRef<Path>) -> ConfigResult<FinisherOptions> {
    let text = std::fs::read_to_string(path)?;
    FinisherOptions::from_yaml_str(&text)
}

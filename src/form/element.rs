//! Form element classification

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What kind of form element an identifier refers to.
///
/// Only the two upload kinds produce file references; every other element
/// type collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Single file or image upload
    UploadSingle,
    /// Multi file or image upload
    UploadMulti,
    /// Any non-upload element
    Other,
}

impl ElementKind {
    /// Classify a form element type name.
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "FileUpload" | "ImageUpload" => Self::UploadSingle,
            "MultiFileUpload" | "MultiImageUpload" => Self::UploadMulti,
            _ => Self::Other,
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, Self::UploadSingle | Self::UploadMulti)
    }
}

/// Resolves form element identifiers to their kind
pub trait ElementLookup {
    /// `None` when the form has no element with this identifier.
    fn element_kind(&self, identifier: &str) -> Option<ElementKind>;
}

/// A minimal form definition: element identifiers and their type names.
///
/// ```yaml
/// elements:
///   images: MultiImageUpload
///   title: Text
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default)]
    pub elements: IndexMap<String, String>,
}

impl FormDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, identifier: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.elements.insert(identifier.into(), type_name.into());
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::config::ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml_str(&text)?)
    }
}

impl ElementLookup for FormDefinition {
    fn element_kind(&self, identifier: &str) -> Option<ElementKind> {
        self.elements
            .get(identifier)
            .map(|type_name| ElementKind::from_type_name(type_name))
    }
}

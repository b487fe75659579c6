//! Submitted element values

use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;

/// A persisted reference to a stored file object.
///
/// `uid_local` is the identity property of the referenced resource. A
/// reference without a backing resource carries `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileReference {
    pub uid_local: Option<i64>,
}

impl FileReference {
    pub fn new(uid_local: i64) -> Self {
        Self {
            uid_local: Some(uid_local),
        }
    }

    /// A reference whose original resource is gone.
    pub fn detached() -> Self {
        Self { uid_local: None }
    }

    /// Identity of the stored file, 0 when there is no backing object.
    pub fn file_uid(&self) -> i64 {
        self.uid_local.unwrap_or(0)
    }
}

/// The value attached to one form element after submission
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadValue {
    /// Nothing submitted
    #[default]
    Empty,
    /// A single file reference
    Single(FileReference),
    /// An ordered collection, as produced by multi-upload elements
    Collection(Vec<UploadValue>),
    /// Anything that is not file-like (text input, checkbox, ...)
    Other(Value),
}

impl UploadValue {
    pub fn single(uid_local: i64) -> Self {
        Self::Single(FileReference::new(uid_local))
    }

    pub fn collection(uids: impl IntoIterator<Item = i64>) -> Self {
        Self::Collection(uids.into_iter().map(Self::single).collect())
    }

    /// Convert a JSON-encoded submission value.
    ///
    /// - `null` becomes `Empty`
    /// - an object with a `uid_local` key becomes `Single`
    /// - an array becomes a `Collection` of its converted items
    /// - everything else is kept as `Other`
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Array(items) => Self::Collection(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => match map.get("uid_local") {
                Some(uid) => Self::Single(FileReference {
                    uid_local: json_to_uid(uid),
                }),
                None => Self::Other(value.clone()),
            },
            other => Self::Other(other.clone()),
        }
    }
}

/// Integer or numeric string; anything else has no identity.
fn json_to_uid(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Per-element submitted values, keyed by element identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    values: IndexMap<String, UploadValue>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, identifier: impl Into<String>, value: UploadValue) -> Self {
        self.insert(identifier, value);
        self
    }

    pub fn insert(&mut self, identifier: impl Into<String>, value: UploadValue) {
        self.values.insert(identifier.into(), value);
    }

    pub fn get(&self, identifier: &str) -> Option<&UploadValue> {
        self.values.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build from a JSON object of `identifier -> value`.
    ///
    /// Returns `None` when the document is not an object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let values = map
            .iter()
            .map(|(id, v)| (id.clone(), UploadValue::from_json(v)))
            .collect();
        Some(Self { values })
    }

    /// Read a JSON values file.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_json(&value).unwrap_or_default())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::config::ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&text)?)
    }
}

impl FromIterator<(String, UploadValue)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (String, UploadValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

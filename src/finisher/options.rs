//! Finisher options and their resolution against earlier stages

use crate::pipeline::StageResults;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// Options of the attach-files finisher, as written in a form definition.
///
/// ```yaml
/// table: 'tx_myext_domain_model_item'
/// recordUid: '{SaveToDatabase.insertedUids.0}'
/// storagePid: 1
/// elements:
///   images:
///     mapOnDatabaseColumn: images
///   files:
///     mapOnDatabaseColumn: files
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinisherOptions {
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub record_uid: RecordUid,
    #[serde(default, deserialize_with = "lenient_int")]
    pub storage_pid: i64,
    /// Element identifier to column mapping, in configuration order
    #[serde(default)]
    pub elements: IndexMap<String, ElementMapping>,
}

/// Per-element column mapping
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Option<RawElementMapping>")]
pub struct ElementMapping {
    pub map_on_database_column: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawElementMapping {
    #[serde(default)]
    map_on_database_column: Option<String>,
}

impl From<Option<RawElementMapping>> for ElementMapping {
    fn from(raw: Option<RawElementMapping>) -> Self {
        Self {
            map_on_database_column: raw.and_then(|r| r.map_on_database_column),
        }
    }
}

impl ElementMapping {
    pub fn column(column: impl Into<String>) -> Self {
        Self {
            map_on_database_column: Some(column.into()),
        }
    }

    /// Target column; the element identifier unless mapped explicitly.
    pub fn target_column<'a>(&'a self, element_identifier: &'a str) -> &'a str {
        self.map_on_database_column
            .as_deref()
            .unwrap_or(element_identifier)
    }
}

/// The owning record's uid, either literal or produced by an earlier stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordUid {
    Id(i64),
    /// `{<stage>.insertedUids.<index>}`
    Deferred { stage: String, index: usize },
}

impl Default for RecordUid {
    fn default() -> Self {
        Self::Id(0)
    }
}

impl RecordUid {
    /// Parse a configured value. Anything that is neither a deferred token
    /// nor starts with an integer is uid 0.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if let Some(token) = trimmed.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
            return Self::parse_token(token).unwrap_or_default();
        }
        Self::Id(parse_int_prefix(trimmed))
    }

    fn parse_token(token: &str) -> Option<Self> {
        let (stage, index) = token.trim().split_once(".insertedUids.")?;
        if stage.is_empty() {
            return None;
        }
        Some(Self::Deferred {
            stage: stage.to_string(),
            index: index.parse().ok()?,
        })
    }

    /// Resolve to a concrete uid; a missing stage result resolves to 0.
    pub fn resolve(&self, stages: &StageResults) -> i64 {
        match self {
            Self::Id(uid) => *uid,
            Self::Deferred { stage, index } => stages.inserted_uid(stage, *index).unwrap_or(0),
        }
    }
}

impl<'de> Deserialize<'de> for RecordUid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Scalar::deserialize(deserializer)? {
            Scalar::Int(uid) => Self::Id(uid),
            Scalar::Float(uid) => Self::Id(uid as i64),
            Scalar::Text(text) => Self::parse(&text),
            Scalar::Null => Self::default(),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    /// Truncated toward zero; `as` saturates and maps NaN to 0
    Float(f64),
    Text(String),
    Null,
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Int(v) => v,
        Scalar::Float(v) => v as i64,
        Scalar::Text(text) => parse_int_prefix(text.trim()),
        Scalar::Null => 0,
    })
}

/// Leading integer of `text` (`"12abc"` is 12), 0 when there is none.
/// Out-of-range values saturate.
fn parse_int_prefix(text: &str) -> i64 {
    let bytes = text.as_bytes();
    let negative = bytes.first() == Some(&b'-');
    let sign_len = usize::from(matches!(bytes.first(), Some(b'-') | Some(b'+')));
    let digits = bytes[sign_len..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return 0;
    }
    text[..sign_len + digits]
        .parse()
        .unwrap_or(if negative { i64::MIN } else { i64::MAX })
}

/// Options with every deferred value resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub table: String,
    pub record_uid: i64,
    pub storage_pid: i64,
    /// Element identifier to target column, in configuration order
    pub elements: IndexMap<String, String>,
}

impl ResolvedOptions {
    /// A missing table or non-positive record uid means there is no
    /// record to attach to for this submission. A table named `"0"` counts
    /// as missing.
    pub fn is_applicable(&self) -> bool {
        self.record_uid > 0 && !self.table.is_empty() && self.table != "0"
    }
}

impl FinisherOptions {
    pub fn new(table: impl Into<String>, record_uid: RecordUid) -> Self {
        Self {
            table: table.into(),
            record_uid,
            ..Self::default()
        }
    }

    pub fn with_storage_pid(mut self, storage_pid: i64) -> Self {
        self.storage_pid = storage_pid;
        self
    }

    pub fn with_element(mut self, identifier: impl Into<String>, mapping: ElementMapping) -> Self {
        self.elements.insert(identifier.into(), mapping);
        self
    }

    pub fn resolve(&self, stages: &StageResults) -> ResolvedOptions {
        ResolvedOptions {
            table: self.table.clone(),
            record_uid: self.record_uid.resolve(stages),
            storage_pid: self.storage_pid,
            elements: self
                .elements
                .iter()
                .map(|(id, mapping)| (id.clone(), mapping.target_column(id).to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("42"), 42);
        assert_eq!(parse_int_prefix("12abc"), 12);
        assert_eq!(parse_int_prefix("-3"), -3);
        assert_eq!(parse_int_prefix("abc"), 0);
        assert_eq!(parse_int_prefix(""), 0);
        assert_eq!(parse_int_prefix("-"), 0);
        assert_eq!(parse_int_prefix("3.7"), 3);
    }

    #[test]
    fn test_parse_int_prefix_saturates() {
        assert_eq!(parse_int_prefix("99999999999999999999"), i64::MAX);
        assert_eq!(parse_int_prefix("-99999999999999999999"), i64::MIN);
        assert_eq!(parse_int_prefix("+99999999999999999999x"), i64::MAX);
    }

    #[test]
    fn test_deserialize_float_and_huge_values() {
        let options: FinisherOptions =
            serde_yaml::from_str("table: t\nrecordUid: 3.0\nstoragePid: 2.9\n").unwrap();
        assert_eq!(options.record_uid, RecordUid::Id(3));
        assert_eq!(options.storage_pid, 2);

        let options: FinisherOptions =
            serde_yaml::from_str("table: t\nrecordUid: '99999999999999999999'\n").unwrap();
        assert_eq!(options.record_uid, RecordUid::Id(i64::MAX));
    }

    #[test]
    fn test_record_uid_parse() {
        assert_eq!(RecordUid::parse("17"), RecordUid::Id(17));
        assert_eq!(RecordUid::parse(" 17 "), RecordUid::Id(17));
        assert_eq!(RecordUid::parse(""), RecordUid::Id(0));
        assert_eq!(
            RecordUid::parse("{SaveToDatabase.insertedUids.0}"),
            RecordUid::Deferred {
                stage: "SaveToDatabase".into(),
                index: 0
            }
        );
        assert_eq!(RecordUid::parse("{SaveToDatabase.title}"), RecordUid::Id(0));
        assert_eq!(RecordUid::parse("{.insertedUids.0}"), RecordUid::Id(0));
    }

    #[test]
    fn test_record_uid_resolve() {
        let stages = StageResults::new().with_inserted_uid("SaveToDatabase", 31);
        let deferred = RecordUid::parse("{SaveToDatabase.insertedUids.0}");
        assert_eq!(deferred.resolve(&stages), 31);
        assert_eq!(RecordUid::parse("{SaveToDatabase.insertedUids.1}").resolve(&stages), 0);
        assert_eq!(RecordUid::parse("{Other.insertedUids.0}").resolve(&stages), 0);
        assert_eq!(RecordUid::Id(5).resolve(&stages), 5);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let options: FinisherOptions = serde_yaml::from_str("table: tx_item\n").unwrap();
        assert_eq!(options.table, "tx_item");
        assert_eq!(options.record_uid, RecordUid::Id(0));
        assert_eq!(options.storage_pid, 0);
        assert!(options.elements.is_empty());
    }

    #[test]
    fn test_deserialize_full_options() {
        let options: FinisherOptions = serde_yaml::from_str(
            r#"
table: tx_item
recordUid: '{SaveToDatabase.insertedUids.0}'
storagePid: '3'
elements:
  images:
    mapOnDatabaseColumn: gallery
  files:
  attachments: {}
"#,
        )
        .unwrap();
        assert_eq!(options.storage_pid, 3);
        let columns: Vec<_> = options
            .elements
            .iter()
            .map(|(id, m)| m.target_column(id).to_string())
            .collect();
        assert_eq!(columns, vec!["gallery", "files", "attachments"]);
    }

    #[test]
    fn test_deserialize_integer_record_uid() {
        let options: FinisherOptions = serde_yaml::from_str("table: t\nrecordUid: 8\n").unwrap();
        assert_eq!(options.record_uid, RecordUid::Id(8));
    }

    #[test]
    fn test_resolve_applicability() {
        let stages = StageResults::new();
        assert!(FinisherOptions::new("tx_item", RecordUid::Id(1)).resolve(&stages).is_applicable());
        assert!(!FinisherOptions::new("", RecordUid::Id(1)).resolve(&stages).is_applicable());
        assert!(!FinisherOptions::new("tx_item", RecordUid::Id(0)).resolve(&stages).is_applicable());
        assert!(!FinisherOptions::new("tx_item", RecordUid::Id(-2)).resolve(&stages).is_applicable());
        assert!(!FinisherOptions::new("0", RecordUid::Id(1)).resolve(&stages).is_applicable());
        assert!(FinisherOptions::new("00", RecordUid::Id(1)).resolve(&stages).is_applicable());
    }
}

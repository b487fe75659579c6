//! Normalize submitted values into file uids

use crate::form::UploadValue;

/// Ordered, positive file uids referenced by a submitted value.
///
/// Collections keep their order; entries that are not file references or
/// have no backing file are dropped without failing the rest. Foreign
/// values extract to nothing.
pub fn extract_file_uids(value: &UploadValue) -> Vec<i64> {
    match value {
        UploadValue::Collection(items) => items
            .iter()
            .map(file_uid)
            .filter(|uid| *uid > 0)
            .collect(),
        UploadValue::Single(_) => {
            let uid = file_uid(value);
            if uid > 0 {
                vec![uid]
            } else {
                Vec::new()
            }
        }
        UploadValue::Empty | UploadValue::Other(_) => Vec::new(),
    }
}

/// Identity of a single file reference, 0 for anything else.
fn file_uid(value: &UploadValue) -> i64 {
    match value {
        UploadValue::Single(reference) => reference.file_uid(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FileReference;
    use serde_json::json;

    #[test]
    fn test_empty_and_foreign_values() {
        assert!(extract_file_uids(&UploadValue::Empty).is_empty());
        assert!(extract_file_uids(&UploadValue::Other(json!("some text"))).is_empty());
        assert!(extract_file_uids(&UploadValue::Other(json!({"name": "x.pdf"}))).is_empty());
        assert!(extract_file_uids(&UploadValue::Collection(vec![])).is_empty());
    }

    #[test]
    fn test_single_reference() {
        assert_eq!(extract_file_uids(&UploadValue::single(9)), vec![9]);
        assert!(extract_file_uids(&UploadValue::single(0)).is_empty());
        assert!(extract_file_uids(&UploadValue::single(-4)).is_empty());
        assert!(extract_file_uids(&UploadValue::Single(FileReference::detached())).is_empty());
    }

    #[test]
    fn test_collection_filters_non_positive_and_keeps_order() {
        let value = UploadValue::collection([5, 0, 7, -1, 3]);
        assert_eq!(extract_file_uids(&value), vec![5, 7, 3]);
    }

    #[test]
    fn test_collection_skips_foreign_entries() {
        let value = UploadValue::Collection(vec![
            UploadValue::single(2),
            UploadValue::Other(json!(17)),
            UploadValue::Empty,
            UploadValue::Single(FileReference::detached()),
            UploadValue::collection([8]),
            UploadValue::single(4),
        ]);
        assert_eq!(extract_file_uids(&value), vec![2, 4]);
    }
}

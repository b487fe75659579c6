//! Shared helpers for filelink integration tests

use filelink::{FormDefinition, OpenStore, SqliteStore};

pub const ITEM_TABLE: &str = "tx_myext_domain_model_item";

/// In-memory store with an item table holding records 1 and 2
pub fn item_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .execute_batch(
            "CREATE TABLE tx_myext_domain_model_item (
                uid INTEGER PRIMARY KEY,
                pid INTEGER NOT NULL DEFAULT 0,
                title TEXT,
                images INTEGER NOT NULL DEFAULT 0,
                files INTEGER NOT NULL DEFAULT 0
            );
            INSERT INTO tx_myext_domain_model_item (uid, title) VALUES (1, 'first'), (2, 'second');",
        )
        .unwrap();
    store
}

/// Form with two multi-upload elements and a text field
pub fn item_form() -> FormDefinition {
    FormDefinition::from_yaml_str(
        "elements:\n  images: MultiImageUpload\n  files: MultiFileUpload\n  title: Text\n",
    )
    .unwrap()
}

/// Link rows of one record as sorted (field, rank, file uid) triples
pub fn summarize(store: &SqliteStore, uid: i64) -> Vec<(String, i64, i64)> {
    let mut links: Vec<_> = store
        .load_file_references(ITEM_TABLE, uid)
        .unwrap()
        .into_iter()
        .map(|l| (l.target_field, l.rank, l.source_identifier))
        .collect();
    links.sort();
    links
}

use justnotes_core::{open_note_store, CoreConfig, StorageMode};
use std::collections::HashMap;

fn config(pairs: &[(&str, &str)]) -> CoreConfig {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    CoreConfig::from_lookup(|key| env.get(key).cloned()).unwrap()
}

#[test]
fn memory_store_starts_with_sample_notes() {
    let store = open_note_store(&config(&[("JUSTNOTES_STORAGE", "memory")])).unwrap();
    let titles: Vec<_> = store
        .snapshot()
        .unwrap()
        .iter()
        .map(|note| note.title.clone())
        .collect();
    assert_eq!(titles.len(), 3);
    assert!(titles.contains(&"Grocery List".to_string()));
}

#[test]
fn sqlite_store_persists_between_opens_and_seeds_once() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("notes.db");
    let db_path_text = db_path.to_str().unwrap();
    let config = config(&[
        ("JUSTNOTES_DB_PATH", db_path_text),
        ("JUSTNOTES_SEED_SAMPLES", "true"),
    ]);
    assert_eq!(config.storage, StorageMode::Sqlite(db_path.clone()));

    {
        let store = open_note_store(&config).unwrap();
        store.add("mine", "").unwrap();
    }

    let reopened = open_note_store(&config).unwrap();
    assert_eq!(reopened.snapshot().unwrap().len(), 4);
}

//! Integration tests for the disk cache, using only the public API

use std::cell::Cell;
use std::fs;

use hockeystats::cache::{encode, CacheError, CacheStore, FetchOptions, KeyEncoding};
use serde_json::{json, Value};
use tempfile::TempDir;

#[derive(Debug, thiserror::Error)]
#[error("network down")]
struct NetworkDown;

fn store_in(temp_dir: &TempDir, encoding: KeyEncoding) -> CacheStore {
    CacheStore::with_encoding(temp_dir.path().join("cache"), encoding)
}

fn sample_document() -> Value {
    json!({
        "copyright": "NHL and the NHL Shield are registered trademarks",
        "teams": [
            {"id": 1, "name": "New Jersey Devils", "active": true, "officialSiteUrl": null},
            {"id": 2, "name": "New York Islanders", "active": false, "venue": {"timeZone": {"offset": -5}}}
        ],
        "ratio": 0.625,
        "big": 9007199254740993u64,
        "empty": {},
        "nested": [[], [1, [2, [3]]]]
    })
}

#[test]
fn test_round_trip_preserves_structure() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir, KeyEncoding::default());
    let url = "https://statsapi.web.nhl.com/api/v1/teams?season=20182019";

    let fetched = store
        .get_or_fetch(url, || Ok::<_, NetworkDown>(sample_document()), FetchOptions::default())
        .unwrap();
    let cached = store
        .get_or_fetch(url, || Err(NetworkDown), FetchOptions::default())
        .unwrap();

    assert_eq!(fetched, sample_document());
    assert_eq!(cached, sample_document());
}

#[test]
fn test_substitute_store_reads_existing_cache_layout() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().join("cache");
    fs::create_dir_all(&cache_dir).unwrap();

    let url = "https://statsapi.web.nhl.com/api/v1/people/8471675";
    let file_name = "https;##statsapi.web.nhl.com#api#v1#people#8471675.json";
    fs::write(cache_dir.join(file_name), r#"{"people": [{"id": 8471675}]}"#).unwrap();
    assert_eq!(format!("{}.json", encode(url)), file_name);

    let store = CacheStore::with_encoding(&cache_dir, KeyEncoding::Substitute);
    let value = store
        .get_or_fetch(url, || Err(NetworkDown), FetchOptions::default())
        .unwrap();
    assert_eq!(value, json!({"people": [{"id": 8471675}]}));
}

#[test]
fn test_substitute_collision_is_avoided_by_escaped_encoding() {
    let temp_dir = TempDir::new().unwrap();

    let substitute = store_in(&temp_dir, KeyEncoding::Substitute);
    substitute
        .get_or_fetch("a:b", || Ok::<_, NetworkDown>(json!("colon")), FetchOptions::default())
        .unwrap();
    let shared = substitute
        .get_or_fetch("a;b", || Ok::<_, NetworkDown>(json!("semicolon")), FetchOptions::default())
        .unwrap();
    assert_eq!(shared, json!("colon"), "substitute keys collide");

    let escaped = store_in(&temp_dir, KeyEncoding::Escaped);
    escaped
        .get_or_fetch("a:b", || Ok::<_, NetworkDown>(json!("colon")), FetchOptions::default())
        .unwrap();
    let distinct = escaped
        .get_or_fetch("a;b", || Ok::<_, NetworkDown>(json!("semicolon")), FetchOptions::default())
        .unwrap();
    assert_eq!(distinct, json!("semicolon"));
}

#[test]
fn test_stores_with_different_directories_are_independent() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let first = store_in(&first_dir, KeyEncoding::Hashed);
    let second = store_in(&second_dir, KeyEncoding::Hashed);

    first
        .get_or_fetch("req", || Ok::<_, NetworkDown>(json!(1)), FetchOptions::default())
        .unwrap();
    assert!(first.contains("req"));
    assert!(!second.contains("req"));
}

#[test]
fn test_entries_survive_a_new_store_instance() {
    let temp_dir = TempDir::new().unwrap();
    store_in(&temp_dir, KeyEncoding::Escaped)
        .get_or_fetch("req", || Ok::<_, NetworkDown>(json!({"v": 1})), FetchOptions::default())
        .unwrap();

    let calls = Cell::new(0);
    let value = store_in(&temp_dir, KeyEncoding::Escaped)
        .get_or_fetch(
            "req",
            || {
                calls.set(calls.get() + 1);
                Ok::<_, NetworkDown>(json!({"v": 2}))
            },
            FetchOptions::default(),
        )
        .unwrap();
    assert_eq!(calls.get(), 0);
    assert_eq!(value, json!({"v": 1}));
}

#[test]
fn test_overwrite_replaces_file_contents() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir, KeyEncoding::Escaped);
    store
        .get_or_fetch("req", || Ok::<_, NetworkDown>(json!({"old": true})), FetchOptions::default())
        .unwrap();
    store
        .get_or_fetch(
            "req",
            || Ok::<_, NetworkDown>(json!({"new": true})),
            FetchOptions::default().overwrite(true),
        )
        .unwrap();

    let on_disk: Value = serde_json::from_slice(&fs::read(store.entry_path("req")).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"new": true}));
}

#[test]
fn test_corrupt_entry_surfaces_decode_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir, KeyEncoding::Substitute);
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.entry_path("http://x?a:b"), "not json").unwrap();

    let err = store
        .get_or_fetch("http://x?a:b", || Ok::<_, NetworkDown>(json!(1)), FetchOptions::default())
        .unwrap_err();
    assert!(matches!(err, CacheError::CorruptEntry { .. }));
    assert!(err.to_string().contains("corrupt cache entry"));
}

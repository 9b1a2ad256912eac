//! CachedStore：读缓存、修改后刷新、写失败后失效。

use std::fs;

use tabular_store::core::cache::CachedStore;
use tabular_store::{MissingKey, RecordStore, TableSchema, TabularStore, Value};
use tempfile::tempdir;

#[test]
fn reads_are_served_from_cache() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(&path, "ID,Name,Age\n1,A,30\n").unwrap();

    let store = CachedStore::new(TabularStore::open(&path, TableSchema::people()));
    assert!(!store.is_cached());
    assert_eq!(store.load().unwrap().len(), 1);
    assert!(store.is_cached());

    // 绕过存储直接改文件，缓存不受影响
    fs::write(&path, "ID,Name,Age\n1,A,30\n2,B,40\n").unwrap();
    assert_eq!(store.load().unwrap().len(), 1);

    store.invalidate();
    assert_eq!(store.load().unwrap().len(), 2);
}

#[test]
fn mutations_persist_and_refresh_cache() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.csv");
    let store = CachedStore::new(TabularStore::open(&path, TableSchema::people()));

    store
        .insert(vec![("Name".into(), "A".into()), ("Age".into(), 30.into())])
        .unwrap();
    store
        .update(&Value::Int(1), vec![("Age".into(), 31.into())], MissingKey::Reject)
        .unwrap();

    assert_eq!(
        store.get(&Value::Int(1)).unwrap().get("Age"),
        Some(&Value::Int(31))
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), "ID,Name,Age\n1,A,31\n");
}

#[test]
fn failed_save_invalidates_cache() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(&path, "ID,Name,Age\n1,A,30\n").unwrap();
    let store = CachedStore::new(TabularStore::open(&path, TableSchema::people()));
    store.load().unwrap();

    // 目标换成非空目录，保存必然失败
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), "x").unwrap();

    assert!(store.delete(&Value::Int(1), MissingKey::Reject).is_err());
    assert!(!store.is_cached());
}

#[test]
fn failed_operation_leaves_cache_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(&path, "ID,Name,Age\n1,A,30\n").unwrap();
    let store = CachedStore::new(TabularStore::open(&path, TableSchema::people()));

    assert!(store
        .update(&Value::Int(9), vec![("Age".into(), 1.into())], MissingKey::Reject)
        .is_err());
    assert_eq!(store.load().unwrap().len(), 1);
    assert_eq!(
        store.get(&Value::Int(1)).unwrap().get("Age"),
        Some(&Value::Int(30))
    );
}

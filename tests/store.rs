//! TabularStore 的增删改查，使用内存存储。

use tabular_store::core::storage::memory::MemoryStorage;
use tabular_store::{
    Column, ColumnKind, KeyPolicy, MissingKey, Mutation, RecordStore, StoreError, Table,
    TableSchema, TabularStore, Value,
};

fn people_with(rows: Vec<Vec<Value>>) -> TabularStore {
    let schema = TableSchema::people();
    let table = Table::from_rows(
        schema.columns.clone(),
        &schema.key,
        schema.key_policy,
        rows,
    )
    .unwrap();
    TabularStore::new(Box::new(MemoryStorage::with_table(table)), schema)
}

fn person(id: i64, name: &str, age: i64) -> Vec<Value> {
    vec![Value::Int(id), name.into(), Value::Int(age)]
}

fn ids(store: &TabularStore) -> Vec<Value> {
    store
        .load()
        .unwrap()
        .records()
        .iter()
        .map(|r| r.get("ID").cloned().unwrap())
        .collect()
}

#[test]
fn insert_then_delete_scenario() {
    let store = people_with(vec![person(1, "A", 30), person(2, "B", 40)]);

    let record = store
        .insert(vec![("Name".into(), "C".into()), ("Age".into(), 25.into())])
        .unwrap();
    assert_eq!(record.get("ID"), Some(&Value::Int(3)));
    assert_eq!(record.get("Name"), Some(&Value::from("C")));
    assert_eq!(record.get("Age"), Some(&Value::Int(25)));
    assert_eq!(store.load().unwrap().len(), 3);

    let outcome = store.delete(&Value::Int(1), MissingKey::Ignore).unwrap();
    assert_eq!(outcome, Mutation::Applied(1));
    assert_eq!(ids(&store), vec![Value::Int(2), Value::Int(3)]);
}

#[test]
fn auto_increment_starts_at_one() {
    let store = TabularStore::in_memory(TableSchema::people());
    let record = store
        .insert(vec![("Name".into(), "First".into()), ("Age".into(), 1.into())])
        .unwrap();
    assert_eq!(record.get("ID"), Some(&Value::Int(1)));
}

#[test]
fn auto_increment_follows_max_key_not_length() {
    let store = people_with(vec![person(5, "E", 50), person(2, "B", 20)]);
    let record = store
        .insert(vec![("Name".into(), "F".into()), ("Age".into(), 60.into())])
        .unwrap();
    assert_eq!(record.get("ID"), Some(&Value::Int(6)));
}

#[test]
fn auto_increment_fails_at_max_key() {
    let store = people_with(vec![person(i64::MAX, "A", 30)]);
    let err = store
        .insert(vec![("Name".into(), "B".into()), ("Age".into(), 1.into())])
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "{:?}", err);
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn insert_requires_declared_fields() {
    let store = TabularStore::in_memory(TableSchema::people());
    let err = store.insert(vec![("Name".into(), "X".into())]).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn form_field_names_match_columns_ignoring_case() {
    let store = TabularStore::in_memory(TableSchema::people());
    let record = store
        .insert(vec![("name".into(), "lower".into()), ("age".into(), "33".into())])
        .unwrap();
    assert_eq!(record.get("Name"), Some(&Value::from("lower")));
    assert_eq!(record.get("Age"), Some(&Value::Int(33)));
}

#[test]
fn deleting_missing_key_twice_is_idempotent() {
    let store = people_with(vec![person(1, "A", 30), person(2, "B", 40)]);
    let before = store.load().unwrap();

    let first = store.delete(&Value::Int(99), MissingKey::Ignore).unwrap();
    let after_once = store.load().unwrap();
    let second = store.delete(&Value::Int(99), MissingKey::Ignore).unwrap();
    let after_twice = store.load().unwrap();

    assert_eq!(first, Mutation::Skipped);
    assert_eq!(second, Mutation::Skipped);
    assert_eq!(before, after_once);
    assert_eq!(after_once, after_twice);
}

#[test]
fn delete_with_reject_policy_reports_not_found() {
    let store = people_with(vec![person(1, "A", 30)]);
    let err = store.delete(&Value::Int(7), MissingKey::Reject).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(err.status_code(), 404);
}

#[test]
fn update_preserves_unspecified_fields() {
    let store = people_with(vec![person(1, "A", 30), person(2, "B", 40)]);
    let outcome = store
        .update(&Value::Int(2), vec![("Name".into(), "Bee".into())], MissingKey::Reject)
        .unwrap();

    let Mutation::Applied(record) = outcome else {
        panic!("update should apply");
    };
    assert_eq!(record.get("Name"), Some(&Value::from("Bee")));
    assert_eq!(record.get("Age"), Some(&Value::Int(40)));
    assert_eq!(
        store.get(&Value::Int(1)).unwrap().get("Name"),
        Some(&Value::from("A"))
    );
}

#[test]
fn update_missing_key_policies_are_distinct() {
    let store = people_with(vec![person(1, "A", 30)]);
    let fields = vec![("Name".to_string(), Value::from("Z"))];

    let ignored = store
        .update(&Value::Int(9), fields.clone(), MissingKey::Ignore)
        .unwrap();
    assert_eq!(ignored, Mutation::Skipped);

    let err = store
        .update(&Value::Int(9), fields, MissingKey::Reject)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn key_lookup_is_type_sensitive() {
    let store = people_with(vec![person(1, "A", 30)]);
    assert!(store.get(&Value::Int(1)).is_ok());
    assert!(matches!(
        store.get(&Value::from("1")),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn parse_key_uses_key_column_kind() {
    let people = TabularStore::in_memory(TableSchema::people());
    assert_eq!(people.parse_key("12").unwrap(), Value::Int(12));
    assert!(matches!(
        people.parse_key("abc"),
        Err(StoreError::Validation(_))
    ));

    let stocks = TabularStore::in_memory(TableSchema::stocks());
    assert_eq!(stocks.parse_key("005930").unwrap(), Value::from("005930"));
}

#[test]
fn caller_supplied_keys_reject_duplicates() {
    let store = TabularStore::in_memory(TableSchema::stocks());
    let stock = |code: &str| {
        vec![
            ("종목코드".to_string(), Value::from(code)),
            ("회사명".to_string(), Value::from("삼성전자")),
            ("현재가".to_string(), Value::Int(70000)),
            ("거래량".to_string(), Value::Int(1200)),
            ("예측".to_string(), Value::Float(0.5)),
        ]
    };

    let record = store.insert(stock("005930")).unwrap();
    assert_eq!(record.get("종목코드"), Some(&Value::from("005930")));

    let err = store.insert(stock("005930")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { .. }));
    assert_eq!(err.status_code(), 409);
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn caller_supplied_key_must_not_be_empty() {
    let schema = TableSchema {
        columns: vec![
            Column::new("code", ColumnKind::Text),
            Column::new("name", ColumnKind::Text),
        ],
        key: "code".to_string(),
        key_policy: KeyPolicy::CallerSupplied,
        required: vec![],
    };
    let store = TabularStore::in_memory(schema);
    let err = store.insert(vec![("name".into(), "x".into())]).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn row_index_addressing_shifts_after_delete() {
    let store = people_with(vec![person(1, "A", 30), person(2, "B", 40), person(3, "C", 50)]);

    let removed = store.delete_at(0).unwrap();
    assert_eq!(removed.get("ID"), Some(&Value::Int(1)));

    // 原来的第 1 行现在是第 0 行
    let updated = store.update_at(0, vec![("Age".into(), 41.into())]).unwrap();
    assert_eq!(updated.get("ID"), Some(&Value::Int(2)));
    assert_eq!(updated.get("Age"), Some(&Value::Int(41)));

    assert!(matches!(store.delete_at(5), Err(StoreError::NotFound { .. })));
}

#[test]
fn failed_mutation_does_not_persist() {
    let store = people_with(vec![person(1, "A", 30)]);
    let before = store.load().unwrap();
    let err = store
        .update(&Value::Int(1), vec![("Age".into(), "old".into())], MissingKey::Reject)
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.load().unwrap(), before);
}

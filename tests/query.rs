//! 过滤、排序、分页的组合。

use tabular_store::{Query, StoreError, Table, TableSchema, Value};

fn table(rows: Vec<(i64, &str, Option<i64>)>) -> Table {
    let schema = TableSchema::people();
    let rows = rows
        .into_iter()
        .map(|(id, name, age)| {
            vec![
                Value::Int(id),
                name.into(),
                age.map(Value::Int).unwrap_or(Value::Empty),
            ]
        })
        .collect();
    Table::from_rows(schema.columns, &schema.key, schema.key_policy, rows).unwrap()
}

fn twelve() -> Table {
    // 奇数 ID 和 12 号的名字里带 "smith"，共 7 条
    table(
        (1..=12)
            .map(|i| {
                let name = if i % 2 == 1 || i == 12 { "Smith" } else { "Jones" };
                (i, name, Some(20 + i))
            })
            .collect(),
    )
}

fn ids(records: &[tabular_store::Record]) -> Vec<i64> {
    records
        .iter()
        .map(|r| match r.get("ID") {
            Some(Value::Int(n)) => *n,
            other => panic!("unexpected key {:?}", other),
        })
        .collect()
}

#[test]
fn paginates_unfiltered_results() {
    let table = twelve();

    let page2 = table.query(&Query::new(2, 5)).unwrap();
    assert_eq!(page2.total, 12);
    assert_eq!(ids(&page2.records), vec![6, 7, 8, 9, 10]);

    let page3 = table.query(&Query::new(3, 5)).unwrap();
    assert_eq!(ids(&page3.records), vec![11, 12]);
    assert_eq!(page3.page_count(), 3);
}

#[test]
fn filters_before_paginating() {
    let table = twelve();

    let page1 = table.query(&Query::new(1, 5).filter("SMITH")).unwrap();
    assert_eq!(page1.total, 7);
    assert_eq!(ids(&page1.records), vec![1, 3, 5, 7, 9]);

    let page2 = table.query(&Query::new(2, 5).filter("smith")).unwrap();
    assert_eq!(ids(&page2.records), vec![11, 12]);
    assert_eq!(page2.page_count(), 2);
}

#[test]
fn filter_matches_numeric_columns_as_text() {
    let table = twelve();
    let page = table.query(&Query::new(1, 10).filter("32")).unwrap();
    assert_eq!(ids(&page.records), vec![12]);
}

#[test]
fn out_of_range_page_is_empty() {
    let page = twelve().query(&Query::new(9, 5)).unwrap();
    assert!(page.records.is_empty());
    assert_eq!(page.total, 12);
}

#[test]
fn zero_page_or_page_size_is_rejected() {
    let table = twelve();
    assert!(matches!(table.query(&Query::new(0, 5)), Err(StoreError::Validation(_))));
    assert!(matches!(table.query(&Query::new(1, 0)), Err(StoreError::Validation(_))));
}

#[test]
fn sorts_after_filtering_and_before_paginating() {
    let table = twelve();
    let query = Query::new(1, 3).filter("smith").sort_by("ID", false);
    let page = table.query(&query).unwrap();
    assert_eq!(ids(&page.records), vec![12, 11, 9]);
}

#[test]
fn unknown_sort_column_keeps_file_order() {
    let table = table(vec![(2, "B", Some(1)), (1, "A", Some(2))]);
    let page = table.query(&Query::new(1, 5).sort_by("Height", true)).unwrap();
    assert_eq!(ids(&page.records), vec![2, 1]);
}

#[test]
fn empty_values_sort_last_in_both_directions() {
    let table = table(vec![(1, "A", None), (2, "B", Some(40)), (3, "C", Some(30))]);

    let asc = table.query(&Query::new(1, 5).sort_by("Age", true)).unwrap();
    assert_eq!(ids(&asc.records), vec![3, 2, 1]);

    let desc = table.query(&Query::new(1, 5).sort_by("Age", false)).unwrap();
    assert_eq!(ids(&desc.records), vec![2, 3, 1]);
}

#[test]
fn sort_is_stable_for_equal_values() {
    let table = table(vec![(1, "Same", Some(1)), (2, "Same", Some(1)), (3, "Other", Some(1))]);
    let page = table.query(&Query::new(1, 5).sort_by("Name", true)).unwrap();
    assert_eq!(ids(&page.records), vec![3, 1, 2]);
}

#[test]
fn query_all_returns_everything() {
    let page = twelve().query(&Query::all().filter("jones")).unwrap();
    assert_eq!(page.records.len(), 5);
    assert_eq!(page.page_count(), 1);
}

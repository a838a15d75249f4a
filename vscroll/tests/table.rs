use std::time::Duration;

use tokio::time::timeout;
use vscroll::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Row {
    name: &'static str,
    age: u32,
}

fn rows() -> Vec<Row> {
    vec![
        Row { name: "ada", age: 36 },
        Row { name: "bob", age: 24 },
        Row { name: "cyd", age: 36 },
        Row { name: "dee", age: 19 },
    ]
}

fn names(rows: &[Row]) -> Vec<&'static str> {
    rows.iter().map(|row| row.name).collect()
}

#[test]
fn test_sort_is_stable() {
    let table = TableDataSource::new(rows());
    table.set_sort(Some(Sort::by_key(|row: &Row| row.age).descending()));
    assert_eq!(names(&table.rendered()), ["ada", "cyd", "bob", "dee"]);

    assert_eq!(table.toggle_sort(), Some(SortDirection::Ascending));
    assert_eq!(names(&table.rendered()), ["dee", "bob", "ada", "cyd"]);
}

#[test]
fn test_toggle_without_sort() {
    let table = TableDataSource::new(rows());
    assert_eq!(table.toggle_sort(), None);
    assert!(table.sort().is_none());
}

#[test]
fn test_filter_runs_before_sort() {
    let table = TableDataSource::new(rows());
    table.set_filter(Some(Filter::new(|row: &Row| row.age > 20)));
    table.set_sort(Some(Sort::new(|a: &Row, b: &Row| a.name.cmp(b.name)).descending()));
    assert_eq!(names(&table.rendered()), ["cyd", "bob", "ada"]);

    table.set_filter(None);
    assert_eq!(table.rendered().len(), 4);
    assert_eq!(table.len(), 4);
}

#[test]
fn test_length_follows_rendered_rows() {
    let table = TableDataSource::new(rows());
    let lengths = table.rendered_len();
    assert_eq!(*lengths.borrow(), 4);

    table.set_filter(Some(Filter::new(|row: &Row| row.age == 36)));
    assert_eq!(*lengths.borrow(), 2);

    table.set_data(Vec::new());
    assert!(table.is_empty());
    assert_eq!(*lengths.borrow(), 0);
}

#[tokio::test]
async fn test_every_assignment_emits() {
    let table = TableDataSource::new(rows());
    let mut stream = table.connect();

    table.set_data(rows());
    let emitted = timeout(Duration::from_secs(1), stream.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*emitted, rows());

    table.update(|rows| rows[0].age = 100);
    let emitted = timeout(Duration::from_secs(1), stream.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(emitted[0].age, 100);
}

#[test]
fn test_clones_share_state() {
    let table = TableDataSource::new(vec![1, 2, 3]);
    let other = table.clone();
    other.set_data(vec![4]);
    assert_eq!(*table.data(), vec![4]);
}

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use vscroll::prelude::*;

const WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
struct Person {
    id: u32,
    age: u32,
}

fn person(id: u32, age: u32) -> Person {
    Person { id, age }
}

fn viewport() -> Arc<FixedSizeViewport> {
    Arc::new(FixedSizeViewport::new(ViewportConfig::default()))
}

fn build<T>(viewport: &Arc<FixedSizeViewport>, data: Vec<T>) -> Arc<VirtualDataSource<T>>
where
    T: Clone + Send + Sync + 'static,
{
    VirtualDataSource::builder()
        .viewport(viewport.clone())
        .data(data)
        .build()
        .unwrap()
}

async fn wait_until<T, F>(stream: &mut DataStream<T>, predicate: F) -> Arc<Vec<T>>
where
    F: FnMut(&[T]) -> bool,
{
    timeout(WAIT, stream.wait_for(predicate))
        .await
        .expect("timed out waiting for slice")
        .expect("stream closed")
}

fn range(start: usize, end: usize) -> ListRange {
    ListRange::new(start, end).unwrap()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_build_without_viewport_fails() {
    let result = VirtualDataSource::<u32>::builder().data(vec![1, 2, 3]).build();
    assert!(matches!(result, Err(Error::Precondition(_))));
}

#[test]
fn test_build_outside_runtime_fails() {
    let result = VirtualDataSource::builder()
        .viewport(viewport())
        .data(vec![1u32, 2, 3])
        .build();
    assert!(matches!(result, Err(Error::Precondition(_))));
}

#[test]
fn test_connect_outside_runtime_uses_build_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let viewport = viewport();
    let source = runtime.block_on(async { build(&viewport, (0..10).collect::<Vec<u32>>()) });

    // Not inside the runtime here.
    let mut visible = source.connect();
    viewport.set_rendered_range(range(2, 4));

    let slice = runtime.block_on(wait_until(&mut visible, |rows| rows == [2, 3]));
    assert_eq!(*slice, vec![2, 3]);
    source.disconnect();
}

#[tokio::test]
async fn test_build_attaches_to_viewport() {
    let viewport = viewport();
    let source = build(&viewport, vec![1u32, 2, 3]);

    assert!(viewport.is_attached());
    assert_eq!(viewport.data_length(), 3);

    drop(source);
    assert!(!viewport.is_attached());
}

#[tokio::test]
async fn test_measure_range_size_is_unsupported() {
    let viewport = viewport();
    let _source = build(&viewport, vec![1u32, 2, 3]);

    let result = viewport.measure_range_size(range(0, 2), Orientation::Vertical);
    assert!(matches!(result, Err(Error::Unsupported(_))));
}

// ============================================================================
// Slicing
// ============================================================================

#[tokio::test]
async fn test_unset_range_shows_everything() {
    let viewport = viewport();
    let data: Vec<u32> = (0..50).collect();
    let source = build(&viewport, data.clone());

    let visible = source.connect();
    assert_eq!(source.rendered_range(), None);
    assert_eq!(*visible.current(), data);
}

#[tokio::test]
async fn test_slice_matches_range() {
    let viewport = viewport();
    let source = build(&viewport, (0..20).collect::<Vec<u32>>());
    let mut visible = source.connect();

    viewport.set_rendered_range(range(5, 9));
    wait_until(&mut visible, |rows| rows == [5, 6, 7, 8]).await;

    viewport.set_rendered_range(range(0, 1));
    wait_until(&mut visible, |rows| rows == [0]).await;
}

#[tokio::test]
async fn test_empty_range_gives_empty_slice() {
    let viewport = viewport();
    let source = build(&viewport, vec![1u32, 2, 3]);
    let mut visible = source.connect();

    viewport.set_rendered_range(range(2, 2));
    wait_until(&mut visible, |rows| rows.is_empty()).await;
}

#[tokio::test]
async fn test_range_past_end_is_clamped() {
    let viewport = viewport();
    let source = build(&viewport, vec![1u32, 2, 3]);
    let mut visible = source.connect();

    viewport.set_rendered_range(range(1, 10));
    wait_until(&mut visible, |rows| rows == [2, 3]).await;

    viewport.set_rendered_range(range(5, 10));
    wait_until(&mut visible, |rows| rows.is_empty()).await;
}

#[tokio::test]
async fn test_measured_viewport_drives_slice() {
    let viewport = Arc::new(FixedSizeViewport::new(
        ViewportConfig::default().with_item_size(10).with_overscan(0),
    ));
    let source = build(&viewport, (0..100).collect::<Vec<u32>>());
    let mut visible = source.connect();

    viewport.set_viewport_size(30);
    wait_until(&mut visible, |rows| rows == [0, 1, 2]).await;

    viewport.scroll_to_index(40);
    wait_until(&mut visible, |rows| rows == [40, 41, 42]).await;
    assert_eq!(viewport.rendered_content_offset(), Some(400));
}

#[tokio::test]
async fn test_viewport_follows_data_loaded_later() {
    let viewport = viewport();
    viewport.set_viewport_size(96);
    let source = build(&viewport, Vec::<u32>::new());
    let mut visible = source.connect();
    assert_eq!(viewport.current_range(), Some(ListRange::empty()));

    source.replace((0..10).collect());

    // Two visible rows plus one row of overscan.
    wait_until(&mut visible, |rows| rows == [0, 1, 2]).await;
    assert_eq!(viewport.data_length(), 10);
}

// ============================================================================
// Mutation
// ============================================================================

#[tokio::test]
async fn test_replacement_is_visible() {
    let viewport = viewport();
    let source = build(&viewport, vec![1u32, 2, 3]);
    let mut visible = source.connect();
    viewport.set_rendered_range(range(0, 2));
    wait_until(&mut visible, |rows| rows == [1, 2]).await;

    source.set_data(&[7, 8, 9]);
    wait_until(&mut visible, |rows| rows == [7, 8]).await;
    assert_eq!(*source.current_data(), vec![7, 8, 9]);
}

#[tokio::test]
async fn test_set_data_copies_input() {
    let viewport = viewport();
    let source = build(&viewport, Vec::<u32>::new());

    let mut rows = vec![1, 2, 3];
    source.set_data(&rows);
    rows[0] = 100;

    let current = source.current_data();
    assert_eq!(*current, vec![1, 2, 3]);
    assert_ne!(current.as_ptr(), rows.as_ptr());
}

#[tokio::test]
async fn test_update_data_leaves_snapshots_alone() {
    let viewport = viewport();
    let source = build(&viewport, vec![1u32, 2, 3]);
    let before = source.current_data();

    source.update_data(|rows| rows.push(4));

    assert_eq!(*before, vec![1, 2, 3]);
    assert_eq!(*source.current_data(), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_mutation_only_shows_inside_range() {
    let viewport = viewport();
    let source = build(
        &viewport,
        vec![person(1, 30), person(2, 40), person(3, 50)],
    );
    let mut visible = source.connect();

    viewport.set_rendered_range(range(1, 3));
    let slice = wait_until(&mut visible, |rows| rows.len() == 2).await;
    assert_eq!(*slice, vec![person(2, 40), person(3, 50)]);

    let mut rows = source.current_data().as_ref().clone();
    rows[0].age = 100;
    source.set_data(&rows);

    // Reassigning re-emits, but row 0 lies outside the range.
    let slice = timeout(WAIT, visible.changed()).await.unwrap().unwrap();
    assert_eq!(*slice, vec![person(2, 40), person(3, 50)]);

    viewport.set_rendered_range(range(0, 2));
    let slice = wait_until(&mut visible, |rows| rows.first().is_some_and(|p| p.id == 1)).await;
    assert_eq!(*slice, vec![person(1, 100), person(2, 40)]);
}

#[tokio::test]
async fn test_sort_and_filter_flow_through() {
    let viewport = viewport();
    let source = build(&viewport, vec![5u32, 3, 8, 1, 9, 2]);
    let mut visible = source.connect();
    viewport.set_rendered_range(range(0, 3));

    source.table().set_sort(Some(Sort::by_key(|n: &u32| *n)));
    wait_until(&mut visible, |rows| rows == [1, 2, 3]).await;

    source.table().toggle_sort();
    wait_until(&mut visible, |rows| rows == [9, 8, 5]).await;

    source.table().set_filter(Some(Filter::new(|n: &u32| n % 2 == 0)));
    wait_until(&mut visible, |rows| rows == [8, 2]).await;

    // The assigned dataset keeps its order.
    assert_eq!(*source.current_data(), vec![5, 3, 8, 1, 9, 2]);
    assert_eq!(*source.data_stream().current(), vec![8, 2]);
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[tokio::test]
async fn test_connect_is_idempotent() {
    let viewport = viewport();
    let source = build(&viewport, (0..10).collect::<Vec<u32>>());

    let mut first = source.connect();
    let mut second = source.connect();
    assert!(source.is_connected());

    viewport.set_rendered_range(range(2, 4));
    wait_until(&mut first, |rows| rows == [2, 3]).await;
    wait_until(&mut second, |rows| rows == [2, 3]).await;
}

#[tokio::test]
async fn test_disconnect_without_connect() {
    let viewport = viewport();
    let source = build(&viewport, vec![1u32, 2]);

    source.disconnect();
    source.disconnect();

    assert!(!source.is_connected());
    assert!(!viewport.is_attached());
}

#[tokio::test]
async fn test_disconnect_leaves_newer_source_attached() {
    let viewport = viewport();
    viewport.set_viewport_size(480);
    let first = build(&viewport, vec![1u32, 2]);
    let second = build(&viewport, vec![1u32, 2, 3]);
    let mut visible = second.connect();

    first.disconnect();
    assert!(viewport.is_attached());
    assert!(matches!(
        viewport.measure_range_size(range(0, 1), Orientation::Vertical),
        Err(Error::Unsupported(_))
    ));

    // The viewport still follows the second source's length.
    second.replace((0..10).collect());
    wait_until(&mut visible, |rows| rows.len() == 10).await;
    assert_eq!(viewport.data_length(), 10);

    second.disconnect();
    assert!(!viewport.is_attached());
}

#[tokio::test]
async fn test_no_emissions_after_disconnect() {
    let viewport = viewport();
    let source = build(&viewport, (0..10).collect::<Vec<u32>>());
    let mut visible = source.connect();
    viewport.set_rendered_range(range(0, 2));
    wait_until(&mut visible, |rows| rows == [0, 1]).await;

    source.disconnect();
    source.disconnect();

    source.set_data(&[42, 43, 44]);
    assert_eq!(timeout(WAIT, visible.changed()).await.unwrap(), None);
    assert!(visible.is_closed());
    assert_eq!(*visible.current(), vec![0, 1]);
}

#[tokio::test]
async fn test_connect_after_disconnect_is_closed() {
    let viewport = viewport();
    let source = build(&viewport, vec![1u32, 2, 3]);
    source.connect();
    source.disconnect();

    let late = source.connect();
    assert!(late.is_closed());
    assert_eq!(*late.current(), vec![1, 2, 3]);
    assert!(!source.is_connected());
}

#[tokio::test]
async fn test_drop_closes_stream() {
    let viewport = viewport();
    let source = build(&viewport, vec![1u32, 2, 3]);
    let mut visible = source.connect();
    visible.wait_for(|_| true).await;

    drop(source);
    assert_eq!(timeout(WAIT, visible.changed()).await.unwrap(), None);
}

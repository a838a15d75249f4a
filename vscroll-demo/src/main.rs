mod people;

use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use simplelog::{Config, LevelFilter, WriteLogger};
use tokio::time::timeout;
use vscroll::prelude::*;

use people::{PeopleService, Person};

/// Height of a table row in pixels.
const ITEM_SIZE: u32 = 48;
/// Visible height of the table body.
const VIEWPORT_HEIGHT: u32 = 480;
const PAGE_SIZE: usize = 50;
const WAIT: Duration = Duration::from_secs(5);

fn print_slice(label: &str, viewport: &FixedSizeViewport, rows: &[Person]) {
    let header_offset = viewport
        .rendered_content_offset()
        .map_or(0, |offset| -(offset as i64));
    match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => println!(
            "{label:<12} {} rows, #{}..#{} (header offset {header_offset}px), first: {} ({})",
            rows.len(),
            first.id,
            last.id,
            first.name,
            first.age
        ),
        _ => println!("{label:<12} nothing to render"),
    }
}

/// Wait until the visible slice satisfies `predicate` and print it.
async fn show<F>(label: &str, viewport: &FixedSizeViewport, visible: &mut DataStream<Person>, predicate: F)
where
    F: FnMut(&[Person]) -> bool,
{
    match timeout(WAIT, visible.wait_for(predicate)).await {
        Ok(Some(rows)) => print_slice(label, viewport, &rows),
        Ok(None) => println!("{label:<12} stream closed"),
        Err(_) => println!("{label:<12} timed out"),
    }
}

/// Scroll, mutate and sort a dataset that is assigned in one go.
async fn scroll_demo(people: Vec<Person>) -> vscroll::Result<()> {
    let viewport = Arc::new(FixedSizeViewport::new(
        ViewportConfig::default().with_item_size(ITEM_SIZE),
    ));
    viewport.set_viewport_size(VIEWPORT_HEIGHT);

    let source = VirtualDataSource::<Person>::builder()
        .viewport(viewport.clone())
        .build()?;
    let mut visible = source.connect();
    show("empty", &viewport, &mut visible, |rows| rows.is_empty()).await;

    let total = people.len();
    source.replace(people);
    show("loaded", &viewport, &mut visible, |rows| !rows.is_empty()).await;
    println!("{:<12} {} people, {}px of content", "", total, viewport.total_content_size());

    viewport.scroll_to_index(100);
    show("scrolled", &viewport, &mut visible, |rows| {
        rows.get(1).is_some_and(|p| p.id == 101)
    })
    .await;

    // Reassigning re-emits; row 0 is outside the range so the rows match.
    source.update_data(|rows| {
        if let Some(first) = rows.first_mut() {
            first.age = 100;
        }
    });
    match timeout(WAIT, visible.changed()).await {
        Ok(Some(rows)) => print_slice("mutated", &viewport, &rows),
        Ok(None) => println!("{:<12} stream closed", "mutated"),
        Err(_) => println!("{:<12} no re-emission", "mutated"),
    }

    viewport.scroll_to_offset(0);
    show("top", &viewport, &mut visible, |rows| {
        rows.first().is_some_and(|p| p.age == 100)
    })
    .await;

    source
        .table()
        .set_sort(Some(Sort::by_key(|p: &Person| p.age).descending()));
    show("oldest", &viewport, &mut visible, |rows| {
        rows.windows(2).all(|w| w[0].age >= w[1].age)
    })
    .await;

    source
        .table()
        .set_filter(Some(Filter::new(|p: &Person| p.age < 30)));
    show("under 30", &viewport, &mut visible, |rows| {
        rows.iter().all(|p| p.age < 30)
    })
    .await;

    source.disconnect();
    Ok(())
}

/// Page through the dataset with a simulated remote service.
async fn pagination_demo(people: Vec<Person>) -> vscroll::Result<()> {
    let paginator = Paginator::new(PAGE_SIZE)?.with_length(people.len());
    let viewport = Arc::new(FixedSizeViewport::new(
        ViewportConfig::default().with_item_size(ITEM_SIZE),
    ));
    viewport.set_viewport_size(VIEWPORT_HEIGHT);

    let source = VirtualDataSource::builder()
        .viewport(viewport.clone())
        .pagination(PaginationConfig::from_paginator(
            &paginator,
            PeopleService::new(people),
        ))
        .config(SourceConfig::default().with_initial_page(paginator.request()))
        .build()?;
    let mut visible = source.connect();
    let mut errors = source.fetch_errors();

    show("page 0", &viewport, &mut visible, |rows| {
        rows.first().is_some_and(|p| p.id == 1)
    })
    .await;

    paginator.next_page();
    paginator.next_page();
    println!(
        "{:<12} {} of {} pages, fetching: {}",
        "",
        paginator.page_index() + 1,
        paginator.number_of_pages(),
        source.is_fetching()
    );
    let first_id = paginator.request().offset() as u32 + 1;
    show("page 2", &viewport, &mut visible, |rows| {
        rows.first().is_some_and(|p| p.id == first_id)
    })
    .await;

    paginator.go_to(paginator.number_of_pages() + 3);
    match timeout(WAIT, errors.recv()).await {
        Ok(Ok(failure)) => println!("{:<12} {}", "error", failure),
        _ => println!("{:<12} no error reported", "error"),
    }
    println!("{:<12} still showing {} rows", "", source.current_data().len());

    source.disconnect();
    Ok(())
}

#[tokio::main]
async fn main() {
    let log_file = File::create("vscroll-demo.log").expect("Failed to create log file");
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .expect("Failed to initialize logger");

    let people = match people::load() {
        Ok(people) => people,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    log::info!("loaded {} people", people.len());

    println!("-- scrolling --");
    if let Err(e) = scroll_demo(people.clone()).await {
        eprintln!("Error: {}", e);
    }

    println!("-- pagination --");
    if let Err(e) = pagination_demo(people).await {
        eprintln!("Error: {}", e);
    }
}

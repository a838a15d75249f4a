//! Page request handling.
//!
//! Every request starts its own fetch as soon as it arrives. Fetches are
//! neither queued nor cancelled by newer requests, so when several overlap
//! the one that resolves last decides the dataset.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::error::PageFetchFailure;
use crate::fetch::{FetchState, PageFetcher};
use crate::paginator::PageRequest;
use crate::table::TableDataSource;

/// Publishes fetch progress and failures.
#[derive(Debug)]
pub(crate) struct FetchTracker {
    state: watch::Sender<FetchState>,
    errors: broadcast::Sender<PageFetchFailure>,
    in_flight: AtomicUsize,
}

impl FetchTracker {
    pub(crate) fn new(error_capacity: usize) -> Self {
        let (state, _) = watch::channel(FetchState::Idle);
        let (errors, _) = broadcast::channel(error_capacity.max(1));
        Self {
            state,
            errors,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn state(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    pub(crate) fn errors(&self) -> broadcast::Receiver<PageFetchFailure> {
        self.errors.subscribe()
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn started(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| {
            *state = FetchState::Loading {
                in_flight: self.in_flight.load(Ordering::SeqCst),
            };
        });
    }

    fn finished(&self, outcome: FetchState) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.state.send_modify(|state| {
            let in_flight = self.in_flight.load(Ordering::SeqCst);
            *state = if in_flight > 0 {
                FetchState::Loading { in_flight }
            } else {
                outcome
            };
        });
    }

    fn failed(&self, failure: PageFetchFailure) {
        log::warn!("{}", failure);
        // Nobody listening on the error channel is not an error.
        let _ = self.errors.send(failure.clone());
        self.finished(FetchState::Failed(failure));
    }

    /// Count a fetch that was dropped without finishing.
    fn abandoned(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.state.send_modify(|state| {
            let in_flight = self.in_flight.load(Ordering::SeqCst);
            if in_flight > 0 {
                *state = FetchState::Loading { in_flight };
            } else if state.is_loading() {
                *state = FetchState::Idle;
            }
        });
    }
}

/// Everything a fetch needs to deliver its page.
pub(crate) struct PageLoader<T> {
    pub(crate) fetcher: Arc<dyn PageFetcher<T>>,
    pub(crate) table: TableDataSource<T>,
    pub(crate) tracker: Arc<FetchTracker>,
    pub(crate) token: CancellationToken,
}

impl<T> Clone for PageLoader<T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            table: self.table.clone(),
            tracker: Arc::clone(&self.tracker),
            token: self.token.clone(),
        }
    }
}

impl<T> PageLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start fetching `request` on its own task.
    pub(crate) fn spawn_fetch(&self, request: PageRequest) {
        let loader = self.clone();
        loader.tracker.started();
        log::debug!("fetching {}", request);
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = loader.token.cancelled() => {
                    log::debug!("dropping fetch of {} after disconnect", request);
                    loader.tracker.abandoned();
                    return;
                }
                result = loader.fetcher.fetch_page(request) => result,
            };
            if loader.token.is_cancelled() {
                log::debug!("dropping late result for {} after disconnect", request);
                loader.tracker.abandoned();
                return;
            }
            match result {
                Ok(rows) => {
                    log::debug!("fetched {} rows for {}", rows.len(), request);
                    loader.table.set_data(rows);
                    loader.tracker.finished(FetchState::Ready(request));
                }
                Err(error) => loader.tracker.failed(PageFetchFailure::new(request, error)),
            }
        });
    }

    /// Start a fetch for every request until the stream ends or the token
    /// is cancelled.
    pub(crate) async fn run(self, mut requests: BoxStream<'static, PageRequest>) {
        loop {
            let request = tokio::select! {
                _ = self.token.cancelled() => break,
                request = requests.next() => match request {
                    Some(request) => request,
                    None => {
                        log::debug!("page request stream ended");
                        break;
                    }
                },
            };
            self.spawn_fetch(request);
        }
    }
}

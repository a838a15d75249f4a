//! Page requests and a paginator that emits them.

use std::num::NonZeroUsize;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::broadcast;

use crate::error::{Error, Result};

/// Capacity of the page request channel. Subscribers that fall further
/// behind skip the oldest requests.
const REQUEST_CAPACITY: usize = 16;

/// A request for one page of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page_index: usize,
    page_size: NonZeroUsize,
}

impl PageRequest {
    /// Create a request, rejecting a zero page size.
    pub fn new(page_index: usize, page_size: usize) -> Result<Self> {
        let page_size = NonZeroUsize::new(page_size).ok_or(Error::InvalidPageSize(page_size))?;
        Ok(Self {
            page_index,
            page_size,
        })
    }

    /// Zero-based index of the page.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Number of rows per page.
    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    /// Index of the first row of the page, saturating at `usize::MAX`.
    pub fn offset(&self) -> usize {
        self.page_index.saturating_mul(self.page_size.get())
    }
}

impl std::fmt::Display for PageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {} (size {})", self.page_index, self.page_size)
    }
}

#[derive(Debug)]
struct PaginatorInner {
    page_index: usize,
    page_size: NonZeroUsize,
    /// Total number of rows across all pages.
    length: usize,
}

impl PaginatorInner {
    fn request(&self) -> PageRequest {
        PageRequest {
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }

    fn number_of_pages(&self) -> usize {
        self.length.div_ceil(self.page_size.get())
    }

    fn has_previous_page(&self) -> bool {
        self.page_index >= 1
    }

    fn has_next_page(&self) -> bool {
        self.page_index.saturating_add(1) < self.number_of_pages()
    }
}

/// Tracks the current page and emits a [`PageRequest`] whenever it changes.
///
/// Cheap to clone; clones share the same position and subscribers.
///
/// # Example
///
/// ```
/// use vscroll::paginator::Paginator;
///
/// let paginator = Paginator::new(20)?.with_length(150);
/// assert_eq!(paginator.number_of_pages(), 8);
///
/// assert!(paginator.next_page());
/// assert_eq!(paginator.page_index(), 1);
/// # Ok::<(), vscroll::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Paginator {
    inner: Arc<RwLock<PaginatorInner>>,
    requests: broadcast::Sender<PageRequest>,
}

impl Paginator {
    /// Create a paginator on page 0 with the given page size.
    pub fn new(page_size: usize) -> Result<Self> {
        let page_size = NonZeroUsize::new(page_size).ok_or(Error::InvalidPageSize(page_size))?;
        let (requests, _) = broadcast::channel(REQUEST_CAPACITY);
        Ok(Self {
            inner: Arc::new(RwLock::new(PaginatorInner {
                page_index: 0,
                page_size,
                length: 0,
            })),
            requests,
        })
    }

    /// Set the total row count.
    pub fn with_length(self, length: usize) -> Self {
        self.set_length(length);
        self
    }

    fn write(&self) -> RwLockWriteGuard<'_, PaginatorInner> {
        self.inner.write().unwrap_or_else(|poisoned| {
            log::warn!("paginator lock poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn read<R>(&self, f: impl FnOnce(&PaginatorInner) -> R) -> R {
        match self.inner.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn emit(&self, request: PageRequest) {
        log::debug!("paginator requesting {}", request);
        // No subscribers is fine, nobody is listening yet.
        let _ = self.requests.send(request);
    }

    // -------------------------------------------------------------------------
    // Position
    // -------------------------------------------------------------------------

    /// Current page index.
    pub fn page_index(&self) -> usize {
        self.read(|g| g.page_index)
    }

    /// Current page size.
    pub fn page_size(&self) -> usize {
        self.read(|g| g.page_size.get())
    }

    /// Total row count.
    pub fn length(&self) -> usize {
        self.read(|g| g.length)
    }

    /// Set the total row count. Does not emit.
    pub fn set_length(&self, length: usize) {
        self.write().length = length;
    }

    /// The request for the current page.
    pub fn request(&self) -> PageRequest {
        self.read(PaginatorInner::request)
    }

    /// Number of pages needed for the total row count.
    pub fn number_of_pages(&self) -> usize {
        self.read(PaginatorInner::number_of_pages)
    }

    /// Returns `true` if there is a page before the current one.
    pub fn has_previous_page(&self) -> bool {
        self.read(PaginatorInner::has_previous_page)
    }

    /// Returns `true` if there is a page after the current one.
    pub fn has_next_page(&self) -> bool {
        self.read(PaginatorInner::has_next_page)
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Move one page forward. Returns `false` if already on the last page.
    pub fn next_page(&self) -> bool {
        self.navigate(|g| g.has_next_page().then(|| g.page_index + 1))
    }

    /// Move one page back. Returns `false` if already on the first page.
    pub fn previous_page(&self) -> bool {
        self.navigate(|g| g.has_previous_page().then(|| g.page_index - 1))
    }

    /// Move to the first page.
    pub fn first_page(&self) -> bool {
        self.navigate(|g| g.has_previous_page().then_some(0))
    }

    /// Move to the last page.
    pub fn last_page(&self) -> bool {
        self.navigate(|g| g.has_next_page().then(|| g.number_of_pages() - 1))
    }

    /// Move to `page_index`, whether or not the total row count is known.
    pub fn go_to(&self, page_index: usize) -> bool {
        self.navigate(|g| (g.page_index != page_index).then_some(page_index))
    }

    /// Change the page size, keeping the first row of the current page on
    /// the new current page. Always emits.
    pub fn set_page_size(&self, page_size: usize) -> Result<()> {
        let page_size = NonZeroUsize::new(page_size).ok_or(Error::InvalidPageSize(page_size))?;
        let request = {
            let mut guard = self.write();
            let first_row = guard.page_index.saturating_mul(guard.page_size.get());
            guard.page_index = first_row / page_size.get();
            guard.page_size = page_size;
            guard.request()
        };
        self.emit(request);
        Ok(())
    }

    /// Emit the current page again.
    pub fn reload(&self) {
        self.emit(self.request());
    }

    fn navigate(&self, target: impl FnOnce(&PaginatorInner) -> Option<usize>) -> bool {
        let request = {
            let mut guard = self.write();
            let Some(page_index) = target(&*guard) else {
                return false;
            };
            guard.page_index = page_index;
            guard.request()
        };
        self.emit(request);
        true
    }

    // -------------------------------------------------------------------------
    // Subscription
    // -------------------------------------------------------------------------

    /// A stream of every request emitted from now on.
    ///
    /// The stream ends when every clone of the paginator is dropped.
    pub fn page_requests(&self) -> BoxStream<'static, PageRequest> {
        futures::stream::unfold(self.requests.subscribe(), |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(request) => return Some((request, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("page request subscriber lagged, skipped {} requests", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_rejects_zero_size() {
        assert!(matches!(PageRequest::new(0, 0), Err(Error::InvalidPageSize(0))));
        let request = PageRequest::new(3, 25).unwrap();
        assert_eq!(request.offset(), 75);
        assert_eq!(request.to_string(), "page 3 (size 25)");
    }

    #[test]
    fn test_number_of_pages() {
        let paginator = Paginator::new(20).unwrap();
        assert_eq!(paginator.number_of_pages(), 0);
        paginator.set_length(150);
        assert_eq!(paginator.number_of_pages(), 8);
        paginator.set_length(160);
        assert_eq!(paginator.number_of_pages(), 8);
    }

    #[test]
    fn test_navigation_bounds() {
        let paginator = Paginator::new(10).unwrap().with_length(30);

        assert!(!paginator.has_previous_page());
        assert!(!paginator.previous_page());
        assert!(!paginator.first_page());

        assert!(paginator.next_page());
        assert!(paginator.next_page());
        assert_eq!(paginator.page_index(), 2);
        assert!(!paginator.next_page());
        assert!(!paginator.last_page());

        assert!(paginator.first_page());
        assert_eq!(paginator.page_index(), 0);
        assert!(paginator.last_page());
        assert_eq!(paginator.page_index(), 2);
    }

    #[test]
    fn test_go_to_ignores_length() {
        let paginator = Paginator::new(10).unwrap();
        assert!(paginator.go_to(4));
        assert_eq!(paginator.page_index(), 4);
        assert!(!paginator.go_to(4));
    }

    #[test]
    fn test_last_possible_page_does_not_overflow() {
        let paginator = Paginator::new(10).unwrap().with_length(100);
        assert!(paginator.go_to(usize::MAX));

        assert!(!paginator.has_next_page());
        assert!(!paginator.next_page());
        assert_eq!(paginator.request().offset(), usize::MAX);

        paginator.set_page_size(20).unwrap();
        assert_eq!(paginator.page_index(), usize::MAX / 20);

        assert!(paginator.first_page());
        assert_eq!(paginator.page_index(), 0);
    }

    #[test]
    fn test_set_page_size_keeps_first_row() {
        let paginator = Paginator::new(10).unwrap().with_length(100);
        paginator.go_to(3);

        paginator.set_page_size(25).unwrap();
        assert_eq!(paginator.page_index(), 1);
        assert_eq!(paginator.page_size(), 25);
        assert!(paginator.set_page_size(0).is_err());
    }

    #[tokio::test]
    async fn test_page_requests_stream() {
        let paginator = Paginator::new(5).unwrap().with_length(50);
        let mut requests = paginator.page_requests();

        paginator.next_page();
        paginator.reload();
        paginator.set_page_size(10).unwrap();

        assert_eq!(requests.next().await, Some(PageRequest::new(1, 5).unwrap()));
        assert_eq!(requests.next().await, Some(PageRequest::new(1, 5).unwrap()));
        assert_eq!(requests.next().await, Some(PageRequest::new(0, 10).unwrap()));

        drop(paginator);
        assert_eq!(requests.next().await, None);
    }
}

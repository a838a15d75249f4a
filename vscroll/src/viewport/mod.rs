//! Fixed-row-height viewport.
//!
//! Tracks the scroll offset and size of a scrollable area whose rows all
//! share one height, and publishes the range of rows that should be
//! rendered.

mod config;

pub use config::*;

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard, Weak};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::range::{ListRange, Orientation};
use crate::source::{RangeSource, Repeater};

/// Internal state for the viewport.
struct ViewportInner {
    config: ViewportConfig,
    /// Visible height in pixels, `None` until measured.
    viewport_size: Option<u32>,
    /// Scroll offset in pixels.
    scroll_offset: u64,
    /// Row count of the attached repeater's data.
    data_length: usize,
    repeater: Option<Weak<dyn Repeater>>,
    /// Task following the repeater's data length.
    length_listener: Option<JoinHandle<()>>,
}

impl ViewportInner {
    fn item_size(&self) -> u64 {
        u64::from(self.config.item_size.max(1))
    }

    fn total_content_size(&self) -> u64 {
        (self.data_length as u64).saturating_mul(self.item_size())
    }

    fn max_scroll_offset(&self) -> u64 {
        let viewport = u64::from(self.viewport_size.unwrap_or(0));
        self.total_content_size().saturating_sub(viewport)
    }

    fn clamp_scroll_offset(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset());
    }

    fn compute_range(&self) -> Option<ListRange> {
        let viewport = u64::from(self.viewport_size?);
        let item_size = self.item_size();
        let overscan = self.config.overscan;

        let first = (self.scroll_offset / item_size) as usize;
        let visible = viewport.div_ceil(item_size) as usize;
        let end = first
            .saturating_add(visible)
            .saturating_add(overscan)
            .min(self.data_length);
        let start = first.saturating_sub(overscan).min(end);
        Some(ListRange::from_ordered(start, end))
    }

    fn stop_listener(&mut self) {
        if let Some(listener) = self.length_listener.take() {
            listener.abort();
        }
    }
}

impl std::fmt::Debug for ViewportInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportInner")
            .field("config", &self.config)
            .field("viewport_size", &self.viewport_size)
            .field("scroll_offset", &self.scroll_offset)
            .field("data_length", &self.data_length)
            .field("attached", &self.repeater.is_some())
            .finish()
    }
}

/// A viewport whose rows all have the same height.
///
/// The rendered range stays unset until [`set_viewport_size`](Self::set_viewport_size)
/// is called. After that it covers the visible rows plus `overscan` rows on
/// each side, clamped to the data length of the attached repeater.
///
/// Cheap to clone; clones share the same state.
///
/// # Example
///
/// ```
/// use vscroll::viewport::{FixedSizeViewport, ViewportConfig};
///
/// let viewport = FixedSizeViewport::new(ViewportConfig::default().with_item_size(10).with_overscan(0));
/// viewport.set_data_length(100);
/// assert_eq!(viewport.current_range(), None);
///
/// viewport.set_viewport_size(50);
/// viewport.scroll_to_offset(200);
/// let range = viewport.current_range().unwrap();
/// assert_eq!((range.start(), range.end()), (20, 25));
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeViewport {
    inner: Arc<RwLock<ViewportInner>>,
    range: Arc<watch::Sender<Option<ListRange>>>,
}

impl FixedSizeViewport {
    /// Create an unmeasured viewport.
    pub fn new(config: ViewportConfig) -> Self {
        let (range, _) = watch::channel(None);
        Self {
            inner: Arc::new(RwLock::new(ViewportInner {
                config,
                viewport_size: None,
                scroll_offset: 0,
                data_length: 0,
                repeater: None,
                length_listener: None,
            })),
            range: Arc::new(range),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, ViewportInner> {
        self.inner.write().unwrap_or_else(|poisoned| {
            log::warn!("viewport lock poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn read<R>(&self, f: impl FnOnce(&ViewportInner) -> R) -> R {
        match self.inner.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    /// Publish the range for the current state, if it changed.
    fn publish(&self, guard: &ViewportInner) {
        let Some(range) = guard.compute_range() else {
            return;
        };
        let changed = self.range.send_if_modified(|current| {
            if *current == Some(range) {
                false
            } else {
                *current = Some(range);
                true
            }
        });
        if changed {
            log::debug!(
                "viewport range {} (offset {}, {} rows)",
                range,
                guard.scroll_offset,
                guard.data_length
            );
        }
    }

    // -------------------------------------------------------------------------
    // Measurements
    // -------------------------------------------------------------------------

    /// The viewport's configuration.
    pub fn config(&self) -> ViewportConfig {
        self.read(|g| g.config.clone())
    }

    /// Set the visible size in pixels. The first call makes the rendered
    /// range known.
    pub fn set_viewport_size(&self, size: u32) {
        let mut guard = self.write();
        guard.viewport_size = Some(size);
        guard.clamp_scroll_offset();
        self.publish(&guard);
    }

    /// The visible size in pixels, if measured.
    pub fn viewport_size(&self) -> Option<u32> {
        self.read(|g| g.viewport_size)
    }

    /// Set the row count directly.
    ///
    /// Normally kept up to date by the attached repeater.
    pub fn set_data_length(&self, length: usize) {
        let mut guard = self.write();
        guard.data_length = length;
        guard.clamp_scroll_offset();
        self.publish(&guard);
    }

    /// Row count of the data being scrolled.
    pub fn data_length(&self) -> usize {
        self.read(|g| g.data_length)
    }

    /// Height of all rows in pixels.
    pub fn total_content_size(&self) -> u64 {
        self.read(ViewportInner::total_content_size)
    }

    // -------------------------------------------------------------------------
    // Scrolling
    // -------------------------------------------------------------------------

    /// Current scroll offset in pixels.
    pub fn scroll_offset(&self) -> u64 {
        self.read(|g| g.scroll_offset)
    }

    /// Scroll to a pixel offset, clamped to the scrollable content.
    pub fn scroll_to_offset(&self, offset: u64) {
        let mut guard = self.write();
        guard.scroll_offset = offset;
        guard.clamp_scroll_offset();
        self.publish(&guard);
    }

    /// Scroll by a pixel delta.
    pub fn scroll_by(&self, delta: i64) {
        let mut guard = self.write();
        guard.scroll_offset = guard.scroll_offset.saturating_add_signed(delta);
        guard.clamp_scroll_offset();
        self.publish(&guard);
    }

    /// Scroll so that row `index` is the first visible row.
    pub fn scroll_to_index(&self, index: usize) {
        let mut guard = self.write();
        guard.scroll_offset = (index as u64).saturating_mul(guard.item_size());
        guard.clamp_scroll_offset();
        self.publish(&guard);
    }

    // -------------------------------------------------------------------------
    // Rendered range
    // -------------------------------------------------------------------------

    /// The rendered range, `None` until measured.
    pub fn current_range(&self) -> Option<ListRange> {
        *self.range.borrow()
    }

    /// Override the rendered range.
    ///
    /// The range is published as given; the next scroll or resize replaces
    /// it with a computed one.
    pub fn set_rendered_range(&self, range: ListRange) {
        self.range.send_if_modified(|current| {
            if *current == Some(range) {
                false
            } else {
                *current = Some(range);
                true
            }
        });
    }

    /// Pixel offset of the first rendered row, used to keep sticky headers
    /// aligned with the rendered rows.
    pub fn rendered_content_offset(&self) -> Option<u64> {
        let item_size = self.read(|g| g.config.item_size.max(1));
        self.current_range().map(|range| range.offset(item_size))
    }

    /// Ask the attached repeater to measure `range`.
    pub fn measure_range_size(&self, range: ListRange, orientation: Orientation) -> Result<f64> {
        let repeater = self
            .read(|g| g.repeater.as_ref().and_then(Weak::upgrade))
            .ok_or(Error::Precondition("no repeater attached to viewport"))?;
        repeater.measure_range_size(range, orientation)
    }

    /// Returns `true` if a live repeater is attached.
    pub fn is_attached(&self) -> bool {
        self.read(|g| g.repeater.as_ref().is_some_and(|r| r.strong_count() > 0))
    }
}

impl RangeSource for FixedSizeViewport {
    fn attach(&self, repeater: Weak<dyn Repeater>) {
        let lengths = repeater.upgrade().map(|r| r.data_length());

        let mut guard = self.write();
        if guard.repeater.is_some() {
            log::warn!("viewport already has a repeater attached, replacing it");
        }
        guard.stop_listener();
        guard.repeater = Some(repeater);

        let Some(mut lengths) = lengths else {
            log::warn!("attached repeater was already dropped");
            return;
        };
        guard.data_length = *lengths.borrow_and_update();
        guard.clamp_scroll_offset();
        self.publish(&guard);

        match Handle::try_current() {
            Ok(handle) => {
                let viewport = self.clone();
                guard.length_listener = Some(handle.spawn(async move {
                    while lengths.changed().await.is_ok() {
                        let length = *lengths.borrow_and_update();
                        viewport.set_data_length(length);
                    }
                }));
            }
            Err(_) => {
                log::warn!("no tokio runtime, viewport will not follow data length changes");
            }
        }
        log::debug!("viewport attached repeater ({} rows)", guard.data_length);
    }

    fn detach(&self, repeater: &Weak<dyn Repeater>) {
        let mut guard = self.write();
        if !guard
            .repeater
            .as_ref()
            .is_some_and(|attached| Weak::ptr_eq(attached, repeater))
        {
            log::trace!("viewport ignoring detach of a repeater it does not hold");
            return;
        }
        guard.stop_listener();
        guard.repeater = None;
        log::debug!("viewport detached repeater");
    }

    fn rendered_range(&self) -> watch::Receiver<Option<ListRange>> {
        self.range.subscribe()
    }
}

//! Viewport configuration.

/// Default row height in pixels.
pub const DEFAULT_ITEM_SIZE: u32 = 48;

/// Configuration for a [`FixedSizeViewport`](super::FixedSizeViewport).
///
/// # Example
///
/// ```
/// use vscroll::viewport::ViewportConfig;
///
/// let config = ViewportConfig::default()
///     .with_item_size(32)
///     .with_overscan(4);
/// assert_eq!(config.item_size, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewportConfig {
    /// Height of every row in pixels.
    ///
    /// Default: 48
    pub item_size: u32,

    /// Rows rendered beyond each edge of the visible area.
    ///
    /// Default: 1
    pub overscan: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            item_size: DEFAULT_ITEM_SIZE,
            overscan: 1,
        }
    }
}

impl ViewportConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row height. A zero height is treated as one pixel.
    pub fn with_item_size(mut self, item_size: u32) -> Self {
        self.item_size = item_size.max(1);
        self
    }

    /// Sets the overscan.
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }
}

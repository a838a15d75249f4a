//! Capability traits shared by data sources, repeaters and viewports.

use std::sync::Weak;

use tokio::sync::watch;

use crate::error::Result;
use crate::range::{ListRange, Orientation};
use crate::stream::DataStream;

/// Something a table can pull rows from.
///
/// `connect` is the only channel through which the rendering layer receives
/// data. `disconnect` releases everything the source set up for it.
pub trait DataSource<T>: Send + Sync {
    /// Return a live view of the rows to render.
    fn connect(&self) -> DataStream<T>;

    /// Release all subscriptions. Must be safe to call more than once.
    fn disconnect(&self);
}

/// Something a viewport can drive.
///
/// A repeater renders the rows of its data inside the range chosen by the
/// viewport it is attached to.
pub trait Repeater: Send + Sync {
    /// Length of the data the repeater renders from.
    ///
    /// The viewport uses it to size its scrollable content.
    fn data_length(&self) -> watch::Receiver<usize>;

    /// Measure the size of the rows in `range` along `orientation`.
    fn measure_range_size(&self, range: ListRange, orientation: Orientation) -> Result<f64>;
}

/// A viewport that reports which rows it wants rendered.
pub trait RangeSource: Send + Sync {
    /// Register the repeater this viewport drives.
    ///
    /// The viewport only holds the repeater weakly.
    fn attach(&self, repeater: Weak<dyn Repeater>);

    /// Forget `repeater` if it is the one attached.
    ///
    /// A repeater that has since been replaced by another leaves the
    /// viewport untouched.
    fn detach(&self, repeater: &Weak<dyn Repeater>);

    /// The rendered range, `None` until the viewport has been measured.
    fn rendered_range(&self) -> watch::Receiver<Option<ListRange>>;
}

//! Replay-latest data streams.
//!
//! A [`DataPublisher`] owns the newest value of a sequence of rows and hands
//! out [`DataStream`] views of it. New subscribers see the newest value
//! immediately; slow subscribers skip intermediate values and observe only
//! the newest one.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::watch;

/// Sending half of a data stream.
#[derive(Debug)]
pub struct DataPublisher<T> {
    tx: watch::Sender<Arc<Vec<T>>>,
}

impl<T> DataPublisher<T> {
    /// Create a publisher holding `initial`.
    pub fn new(initial: Vec<T>) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// Publish a new value, notifying every subscriber.
    ///
    /// Subscribers are notified even if the value is equal to the previous
    /// one.
    pub fn publish(&self, value: Arc<Vec<T>>) {
        self.tx.send_replace(value);
    }

    /// The newest published value.
    pub fn current(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.tx.borrow())
    }

    /// Create a new view of this publisher.
    pub fn subscribe(&self) -> DataStream<T> {
        DataStream::new(self.tx.subscribe())
    }
}

impl<T> Default for DataPublisher<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// A live, replay-latest view of a sequence of rows.
///
/// Cloning a stream yields another view of the same publisher.
#[derive(Debug)]
pub struct DataStream<T> {
    rx: watch::Receiver<Arc<Vec<T>>>,
}

impl<T> DataStream<T> {
    pub(crate) fn new(rx: watch::Receiver<Arc<Vec<T>>>) -> Self {
        Self { rx }
    }

    /// A stream that holds `value` and will never change.
    pub(crate) fn closed(value: Arc<Vec<T>>) -> Self {
        let (_, rx) = watch::channel(value);
        Self { rx }
    }

    /// The newest value, without marking it as seen.
    pub fn current(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.rx.borrow())
    }

    /// Returns `true` if a value was published that this view has not seen.
    ///
    /// Returns `false` once the publisher is gone.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Returns `true` once the publisher has been dropped.
    pub fn is_closed(&self) -> bool {
        self.rx.has_changed().is_err()
    }

    /// Wait for the next unseen value.
    ///
    /// Returns `None` once the publisher is gone and every value was seen.
    pub async fn changed(&mut self) -> Option<Arc<Vec<T>>> {
        self.rx.changed().await.ok()?;
        Some(Arc::clone(&self.rx.borrow_and_update()))
    }

    /// Wait until the newest value satisfies `predicate`.
    ///
    /// Checks the current value first. Returns `None` if the publisher goes
    /// away before a matching value is published.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<Arc<Vec<T>>>
    where
        F: FnMut(&[T]) -> bool,
    {
        let value = self.rx.wait_for(|data| predicate(data)).await.ok()?;
        Some(Arc::clone(&value))
    }

    /// Convert into a [`futures::Stream`] that starts with the current value
    /// and yields every value this view observes afterwards.
    pub fn into_stream(self) -> BoxStream<'static, Arc<Vec<T>>>
    where
        T: Send + Sync + 'static,
    {
        let mut rx = self.rx;
        let first = Arc::clone(&rx.borrow_and_update());
        let rest = futures::stream::unfold(rx, |mut rx| async move {
            rx.changed().await.ok()?;
            let value = Arc::clone(&rx.borrow_and_update());
            Some((value, rx))
        });
        futures::stream::once(async move { first })
            .chain(rest)
            .boxed()
    }
}

impl<T> Clone for DataStream<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_subscriber_sees_latest_value() {
        let publisher = DataPublisher::new(vec![1]);
        publisher.publish(Arc::new(vec![1, 2]));

        let stream = publisher.subscribe();
        assert_eq!(*stream.current(), vec![1, 2]);
        assert!(!stream.has_changed());
    }

    #[test]
    fn test_equal_value_still_notifies() {
        let publisher = DataPublisher::new(vec![1, 2]);
        let stream = publisher.subscribe();

        publisher.publish(Arc::new(vec![1, 2]));
        assert!(stream.has_changed());
    }

    #[tokio::test]
    async fn test_changed_returns_none_after_publisher_dropped() {
        let publisher = DataPublisher::new(vec![1]);
        let mut stream = publisher.subscribe();

        publisher.publish(Arc::new(vec![2]));
        drop(publisher);

        assert_eq!(stream.changed().await.as_deref(), Some(&vec![2]));
        assert!(stream.changed().await.is_none());
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn test_into_stream_starts_with_current() {
        let publisher = DataPublisher::new(vec![1]);
        let mut stream = publisher.subscribe().into_stream();

        assert_eq!(*stream.next().await.unwrap(), vec![1]);
        publisher.publish(Arc::new(vec![3]));
        assert_eq!(*stream.next().await.unwrap(), vec![3]);

        drop(publisher);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_closed_stream_keeps_value() {
        let stream = DataStream::closed(Arc::new(vec!['x']));
        assert!(stream.is_closed());
        assert_eq!(*stream.current(), vec!['x']);
    }
}

//! Live subscription handles.
//!
//! A [`Subscription`] is the consumer end of a live feed: it delivers the
//! full current state immediately on registration and again after every
//! change signal. The handle is also the disposer - `unsubscribe()` (or
//! dropping the handle) aborts the delivery task and releases the channel.

use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A live feed of snapshots of type `T`.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Subscription<T> {
    /// Spawn a delivery task that sends one snapshot immediately and one
    /// after every signal on `changes`.
    ///
    /// `load` produces the current snapshot; a `None` result (load failure,
    /// already logged by the loader) skips that delivery rather than ending
    /// the feed.
    pub(crate) fn spawn<F, Fut>(mut changes: watch::Receiver<u64>, load: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Option<T>> + Send,
    {
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            // Snapshot delivered on registration.
            changes.mark_unchanged();
            if let Some(snapshot) = load().await
                && tx.send(snapshot).is_err()
            {
                return;
            }

            while changes.changed().await.is_ok() {
                if let Some(snapshot) = load().await
                    && tx.send(snapshot).is_err()
                {
                    return;
                }
            }
        });

        Self { rx, task }
    }

    /// A feed that delivers `value` once and then nothing further.
    ///
    /// Used for subscribers that have nothing to watch (an anonymous
    /// favorites subscriber still receives one empty set).
    pub(crate) fn once(value: T) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(value);
        // Channel closes when tx drops; recv drains the one snapshot first.
        let task = tokio::spawn(async {});
        Self { rx, task }
    }

    /// Receive the next snapshot. Returns `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stop delivery and release the live channel.
    pub fn unsubscribe(self) {
        // Drop does the actual work; taking `self` by value makes the
        // disposal single-use at the type level.
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

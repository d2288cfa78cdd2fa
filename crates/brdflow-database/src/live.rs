//! Live query handle.

use tokio::sync::mpsc;

use brdflow_core::result::AppResult;

/// A running live query.
///
/// Each item is the complete current result set. The first item is the
/// initial result; later items follow every relevant document change.
/// Dropping the handle (or calling [`LiveQuery::cancel`]) unsubscribes.
#[derive(Debug)]
pub struct LiveQuery<T> {
    rx: mpsc::Receiver<AppResult<Vec<T>>>,
}

impl<T> LiveQuery<T> {
    /// Wrap the receiving half of a store-side emission channel.
    pub fn new(rx: mpsc::Receiver<AppResult<Vec<T>>>) -> Self {
        Self { rx }
    }

    /// Wait for the next emission. `None` once the store closes the query.
    pub async fn next(&mut self) -> Option<AppResult<Vec<T>>> {
        self.rx.recv().await
    }

    /// Unsubscribe explicitly.
    pub fn cancel(self) {
        drop(self);
    }
}

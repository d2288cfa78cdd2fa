//! Best-effort write-back of read state.
//!
//! Local state is updated before anything here runs and is never rolled
//! back. Only comment notifications own a document whose `read` flag can be
//! written; status notifications are skipped.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use brdflow_core::types::id::{CommentId, RequestId};
use brdflow_database::store::DocumentStore;
use brdflow_entity::notification::Notification;

/// Result of one write-back round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Writes issued.
    pub attempted: usize,
    /// Writes that failed (logged, not retried).
    pub failed: usize,
}

/// Handle to in-flight read-state writes. Dropping it detaches the writes.
#[derive(Debug)]
#[must_use = "drop explicitly to detach, or call `wait` to observe the outcome"]
pub struct PendingWrites {
    handle: Option<JoinHandle<WriteSummary>>,
}

impl PendingWrites {
    /// No writes were needed.
    pub fn none() -> Self {
        Self { handle: None }
    }

    /// Wait for every write to settle.
    pub async fn wait(self) -> WriteSummary {
        match self.handle {
            None => WriteSummary::default(),
            Some(handle) => handle.await.unwrap_or_else(|e| {
                error!("Read-state write task failed: {}", e);
                WriteSummary::default()
            }),
        }
    }
}

/// Persists read flags of comment notifications to the document store.
#[derive(Clone)]
pub struct ReadStateSynchronizer {
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for ReadStateSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadStateSynchronizer").finish()
    }
}

impl ReadStateSynchronizer {
    /// Create a synchronizer writing to `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Issue one `read: true` write per comment notification, concurrently.
    ///
    /// Each write is independent: a failure is logged and does not stop the
    /// others.
    pub fn persist(&self, notifications: &[Notification]) -> PendingWrites {
        let targets: Vec<(RequestId, CommentId)> = notifications
            .iter()
            .filter_map(|n| {
                let comment_id = n.kind.persisted_comment()?;
                Some((n.request_id.clone(), comment_id.clone()))
            })
            .collect();

        if targets.is_empty() {
            return PendingWrites::none();
        }

        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            let writes = targets.iter().map(|(request_id, comment_id)| {
                let store = Arc::clone(&store);
                async move {
                    let result = store.mark_comment_read(request_id, comment_id).await;
                    (request_id, comment_id, result)
                }
            });

            let mut summary = WriteSummary {
                attempted: targets.len(),
                failed: 0,
            };
            for (request_id, comment_id, result) in join_all(writes).await {
                if let Err(e) = result {
                    summary.failed += 1;
                    warn!(
                        request_id = %request_id,
                        comment_id = %comment_id,
                        error = %e,
                        "Failed to persist comment read state"
                    );
                }
            }
            debug!(
                attempted = summary.attempted,
                failed = summary.failed,
                "Read-state writes settled"
            );
            summary
        });

        PendingWrites {
            handle: Some(handle),
        }
    }
}

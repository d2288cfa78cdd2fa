//! Single consumer that owns the reconciler.
//!
//! Every watcher and every read-state call sends a [`FeedEvent`] into one
//! bounded channel; this task applies them strictly one at a time and
//! publishes a snapshot after each.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use brdflow_core::types::id::NotificationId;
use brdflow_entity::notification::Notification;

use crate::notification::reconciler::{MarkedRead, NotificationReconciler};
use crate::subscription::key::SubscriptionKey;

use super::snapshot::FeedSnapshot;

/// A mutation request for the aggregate.
#[derive(Debug)]
pub(crate) enum FeedEvent {
    /// One emission of one subscription.
    Batch {
        source: SubscriptionKey,
        notifications: Vec<Notification>,
    },
    /// Mark one notification read.
    MarkRead {
        id: NotificationId,
        reply: oneshot::Sender<Option<MarkedRead>>,
    },
    /// Mark everything read; replies with the entries that were unread.
    MarkAllRead {
        reply: oneshot::Sender<Vec<Notification>>,
    },
}

/// Run until every sender is dropped.
pub(crate) async fn run(
    mut reconciler: NotificationReconciler,
    mut events: mpsc::Receiver<FeedEvent>,
    snapshots: Arc<watch::Sender<FeedSnapshot>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            FeedEvent::Batch {
                source,
                notifications,
            } => {
                debug!(subscription = %source, candidates = notifications.len(), "Batch received");
                reconciler.merge(notifications);
            }
            FeedEvent::MarkRead { id, reply } => {
                let marked = reconciler.mark_read(&id);
                // The caller may have given up waiting; local state stays marked.
                let _ = reply.send(marked);
            }
            FeedEvent::MarkAllRead { reply } => {
                let changed = reconciler.mark_all_read();
                let _ = reply.send(changed);
            }
        }
        snapshots.send_replace(FeedSnapshot::of(&reconciler));
    }
    debug!("Notification aggregator stopped");
}

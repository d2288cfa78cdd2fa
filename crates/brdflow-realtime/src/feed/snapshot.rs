//! Published view of the feed.

use serde::Serialize;

use brdflow_entity::notification::Notification;

use crate::notification::reconciler::NotificationReconciler;

/// The reconciled list and its unread count at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    /// Notifications, newest first.
    pub notifications: Vec<Notification>,
    /// Number of unread notifications.
    pub unread_count: usize,
}

impl FeedSnapshot {
    /// Capture the current state of a reconciler.
    pub fn of(reconciler: &NotificationReconciler) -> Self {
        Self {
            notifications: reconciler.items().to_vec(),
            unread_count: reconciler.unread_count(),
        }
    }
}

//! Notification value model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brdflow_core::types::id::{NotificationId, RequestId};

use super::kind::NotificationKind;

/// A notification in the viewer's reconciled feed.
///
/// Built fresh from every live-query emission and merged by key; it has no
/// document of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Deduplication key.
    pub id: NotificationId,
    /// The request the notification is about.
    pub request_id: RequestId,
    /// Project name resolved when the subscription was opened.
    pub request_name: String,
    /// Source-specific fields.
    #[serde(flatten)]
    pub kind: NotificationKind,
    /// Comment text, or the status message for status notifications.
    pub message: String,
    /// Ordering key.
    pub timestamp: DateTime<Utc>,
    /// Whether the viewer has read it.
    pub read: bool,
}

impl Notification {
    /// Check if the notification is still unread.
    pub fn is_unread(&self) -> bool {
        !self.read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestStatus;
    use brdflow_core::types::id::{CommentId, UserId};

    #[test]
    fn test_comment_notification_wire_shape() {
        let n = Notification {
            id: NotificationId::for_comment(&CommentId::new("c9")),
            request_id: RequestId::new("r1"),
            request_name: "Loan Origination".to_string(),
            kind: NotificationKind::Comment {
                comment_id: CommentId::new("c9"),
                user_id: UserId::new("ba-1"),
                user_name: "Sari".to_string(),
            },
            message: "Please review section 3".to_string(),
            timestamp: DateTime::from_timestamp(100, 0).expect("valid"),
            read: false,
        };
        let json = serde_json::to_value(&n).expect("serialize");
        assert_eq!(json["type"], "comment");
        assert_eq!(json["id"], "comment_c9");
        assert_eq!(json["userName"], "Sari");
        assert_eq!(json["requestName"], "Loan Origination");

        let back: Notification = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.kind.persisted_comment(), Some(&CommentId::new("c9")));
        assert_eq!(back, n);
    }

    #[test]
    fn test_status_kind_does_not_persist_reads() {
        let kind = NotificationKind::Status {
            status: RequestStatus::Rejected,
        };
        assert!(kind.persisted_comment().is_none());
    }
}

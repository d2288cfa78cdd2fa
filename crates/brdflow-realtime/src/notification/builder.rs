//! Maps store documents to notification candidates.

use chrono::{DateTime, Utc};

use brdflow_core::types::id::{NotificationId, UserId};
use brdflow_entity::comment::Comment;
use brdflow_entity::notification::{Notification, NotificationKind};
use brdflow_entity::request::BrdRequest;

use super::messages::status_message;

/// Builds candidates for one viewer over one lookback window.
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
    viewer: UserId,
    since: DateTime<Utc>,
}

impl CandidateBuilder {
    /// Create a builder for `viewer` considering activity at or after `since`.
    pub fn new(viewer: UserId, since: DateTime<Utc>) -> Self {
        Self { viewer, since }
    }

    /// The viewer notifications are built for.
    pub fn viewer(&self) -> &UserId {
        &self.viewer
    }

    /// Start of the lookback window.
    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    /// Build the notification for a comment, if it should surface.
    ///
    /// Comments written by the viewer, and comments not explicitly
    /// addressed to the viewer, produce nothing. A pending timestamp is
    /// replaced by `now`.
    pub fn comment(
        &self,
        comment: &Comment,
        request_name: &str,
        now: DateTime<Utc>,
    ) -> Option<Notification> {
        if comment.is_authored_by(&self.viewer) || !comment.is_addressed_to(&self.viewer) {
            return None;
        }

        Some(Notification {
            id: NotificationId::for_comment(&comment.id),
            request_id: comment.request_id.clone(),
            request_name: request_name.to_string(),
            kind: NotificationKind::Comment {
                comment_id: comment.id.clone(),
                user_id: comment.user_id.clone(),
                user_name: comment.user_name.clone(),
            },
            message: comment.text.clone(),
            timestamp: comment.timestamp.unwrap_or(now),
            read: comment.read,
        })
    }

    /// Build the notification for a request's status, if it should surface.
    ///
    /// Only requests the viewer created, outside the initial status, and
    /// updated inside the lookback window qualify. Status notifications
    /// always start unread.
    pub fn status(&self, request: &BrdRequest) -> Option<Notification> {
        if request.created_by != self.viewer
            || request.status.is_initial()
            || request.updated_at < self.since
        {
            return None;
        }

        Some(Notification {
            id: NotificationId::for_status(&request.id),
            request_id: request.id.clone(),
            request_name: request.project_name.clone(),
            kind: NotificationKind::Status {
                status: request.status.clone(),
            },
            message: status_message(&request.status).to_string(),
            timestamp: request.updated_at,
            read: false,
        })
    }

    /// Build candidates for one emission of a comment subscription.
    pub fn comments(&self, comments: &[Comment], request_name: &str) -> Vec<Notification> {
        let now = Utc::now();
        comments
            .iter()
            .filter_map(|c| self.comment(c, request_name, now))
            .collect()
    }

    /// Build candidates for one emission of the status subscription.
    pub fn statuses(&self, requests: &[BrdRequest]) -> Vec<Notification> {
        requests.iter().filter_map(|r| self.status(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brdflow_core::types::id::{CommentId, RequestId};
    use brdflow_entity::request::RequestStatus;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    fn builder() -> CandidateBuilder {
        CandidateBuilder::new(UserId::new("A"), ts(10))
    }

    fn comment(author: &str, recipient: Option<&str>) -> Comment {
        Comment {
            id: CommentId::new("1"),
            request_id: RequestId::new("r1"),
            user_id: UserId::new(author),
            user_name: format!("user {author}"),
            text: "Need the data dictionary".to_string(),
            timestamp: Some(ts(100)),
            read: false,
            recipient_id: recipient.map(UserId::new),
        }
    }

    fn request(created_by: &str, status: RequestStatus, updated: i64) -> BrdRequest {
        BrdRequest {
            id: RequestId::new("42"),
            project_name: "Payments Hub".to_string(),
            created_by: UserId::new(created_by),
            assigned_analyst_id: Some(UserId::new("B")),
            status,
            updated_at: ts(updated),
        }
    }

    #[test]
    fn test_comment_addressed_to_viewer() {
        let n = builder()
            .comment(&comment("B", Some("A")), "Payments Hub", ts(500))
            .expect("notification");
        assert_eq!(n.id.as_str(), "comment_1");
        assert_eq!(n.message, "Need the data dictionary");
        assert_eq!(n.timestamp, ts(100));
        assert!(!n.read);
        assert!(matches!(n.kind, NotificationKind::Comment { ref user_name, .. } if user_name == "user B"));
    }

    #[test]
    fn test_self_comment_never_surfaces() {
        assert!(builder().comment(&comment("A", Some("A")), "x", ts(500)).is_none());
        assert!(builder().comment(&comment("A", Some("B")), "x", ts(500)).is_none());
        assert!(builder().comment(&comment("A", None), "x", ts(500)).is_none());
    }

    #[test]
    fn test_unaddressed_comment_is_skipped() {
        assert!(builder().comment(&comment("B", None), "x", ts(500)).is_none());
        assert!(builder().comment(&comment("B", Some("C")), "x", ts(500)).is_none());
    }

    #[test]
    fn test_pending_timestamp_defaults_to_now() {
        let mut pending = comment("B", Some("A"));
        pending.timestamp = None;
        let n = builder().comment(&pending, "x", ts(777)).expect("notification");
        assert_eq!(n.timestamp, ts(777));
    }

    #[test]
    fn test_persisted_read_flag_is_carried() {
        let mut read = comment("B", Some("A"));
        read.read = true;
        assert!(builder().comment(&read, "x", ts(500)).expect("notification").read);
    }

    #[test]
    fn test_status_notification() {
        let n = builder()
            .status(&request("A", RequestStatus::Rejected, 60))
            .expect("notification");
        assert_eq!(n.id.as_str(), "status_42");
        assert_eq!(n.message, "BRD has been rejected");
        assert_eq!(n.request_name, "Payments Hub");
        assert_eq!(n.timestamp, ts(60));
        assert!(!n.read);
    }

    #[test]
    fn test_status_filters() {
        let b = builder();
        assert!(b.status(&request("A", RequestStatus::New, 60)).is_none());
        assert!(b.status(&request("B", RequestStatus::Completed, 60)).is_none());
        assert!(b.status(&request("A", RequestStatus::Completed, 5)).is_none());
        assert!(b.status(&request("A", RequestStatus::Completed, 10)).is_some());
    }
}

//! Query filters understood by the document store.

use chrono::{DateTime, Utc};

use brdflow_core::types::id::UserId;
use brdflow_entity::comment::Comment;
use brdflow_entity::request::{BrdRequest, RequestStatus};

/// Conjunctive filter over the `brd_requests` collection. Unset fields
/// match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFilter {
    /// `createdBy == user`.
    pub created_by: Option<UserId>,
    /// `assignedAnalystId == user`.
    pub assigned_analyst: Option<UserId>,
    /// `updatedAt >= instant`.
    pub updated_since: Option<DateTime<Utc>>,
    /// `status != value`.
    pub exclude_status: Option<RequestStatus>,
}

impl RequestFilter {
    /// Requests created by `user`.
    pub fn created_by(user: UserId) -> Self {
        Self {
            created_by: Some(user),
            ..Self::default()
        }
    }

    /// Requests assigned to `user`.
    pub fn assigned_to(user: UserId) -> Self {
        Self {
            assigned_analyst: Some(user),
            ..Self::default()
        }
    }

    /// Restrict to requests updated at or after `since`.
    pub fn updated_since(mut self, since: DateTime<Utc>) -> Self {
        self.updated_since = Some(since);
        self
    }

    /// Exclude requests currently in `status`.
    pub fn excluding_status(mut self, status: RequestStatus) -> Self {
        self.exclude_status = Some(status);
        self
    }

    /// Evaluate the filter against a request document.
    pub fn matches(&self, request: &BrdRequest) -> bool {
        if let Some(user) = &self.created_by {
            if &request.created_by != user {
                return false;
            }
        }
        if let Some(user) = &self.assigned_analyst {
            if request.assigned_analyst_id.as_ref() != Some(user) {
                return false;
            }
        }
        if let Some(since) = self.updated_since {
            if request.updated_at < since {
                return false;
            }
        }
        if let Some(status) = &self.exclude_status {
            if &request.status == status {
                return false;
            }
        }
        true
    }
}

/// Filter over one request's comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentQuery {
    /// Only comments with `timestamp >= since`. Comments whose timestamp is
    /// still pending always match.
    pub since: DateTime<Utc>,
}

impl CommentQuery {
    /// Comments written at or after `since`.
    pub fn since(since: DateTime<Utc>) -> Self {
        Self { since }
    }

    /// Evaluate the filter against a comment document.
    pub fn matches(&self, comment: &Comment) -> bool {
        comment.timestamp.is_none_or(|ts| ts >= self.since)
    }
}

/// Order comments newest first. Pending timestamps sort before all others.
pub fn sort_newest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (Some(x), Some(y)) => y.cmp(&x),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use brdflow_core::types::id::{CommentId, RequestId};

    fn request(created_by: &str, analyst: Option<&str>, status: RequestStatus) -> BrdRequest {
        BrdRequest {
            id: RequestId::new("r1"),
            project_name: "Core Banking Upgrade".to_string(),
            created_by: UserId::new(created_by),
            assigned_analyst_id: analyst.map(UserId::new),
            status,
            updated_at: DateTime::from_timestamp(1_000, 0).expect("valid"),
        }
    }

    fn comment_at(id: &str, ts: Option<i64>) -> Comment {
        Comment {
            id: CommentId::new(id),
            request_id: RequestId::new("r1"),
            user_id: UserId::new("u"),
            user_name: "U".to_string(),
            text: "hi".to_string(),
            timestamp: ts.map(|s| DateTime::from_timestamp(s, 0).expect("valid")),
            read: false,
            recipient_id: None,
        }
    }

    #[test]
    fn test_filter_is_conjunctive() {
        let req = request("alice", Some("bob"), RequestStatus::InProgress);
        assert!(RequestFilter::created_by(UserId::new("alice")).matches(&req));
        assert!(RequestFilter::assigned_to(UserId::new("bob")).matches(&req));
        assert!(!RequestFilter::assigned_to(UserId::new("alice")).matches(&req));

        let recent = RequestFilter::created_by(UserId::new("alice"))
            .updated_since(DateTime::from_timestamp(2_000, 0).expect("valid"));
        assert!(!recent.matches(&req));
    }

    #[test]
    fn test_filter_excludes_status() {
        let filter = RequestFilter::default().excluding_status(RequestStatus::New);
        assert!(!filter.matches(&request("a", None, RequestStatus::New)));
        assert!(filter.matches(&request("a", None, RequestStatus::Rejected)));
    }

    #[test]
    fn test_comment_query_keeps_pending_timestamps() {
        let query = CommentQuery::since(DateTime::from_timestamp(50, 0).expect("valid"));
        assert!(query.matches(&comment_at("a", None)));
        assert!(query.matches(&comment_at("b", Some(50))));
        assert!(!query.matches(&comment_at("c", Some(49))));
    }

    #[test]
    fn test_sort_newest_first() {
        let mut comments = vec![
            comment_at("old", Some(1)),
            comment_at("pending", None),
            comment_at("new", Some(9)),
        ];
        sort_newest_first(&mut comments);
        let order: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["pending", "new", "old"]);
    }
}

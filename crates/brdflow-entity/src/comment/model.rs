//! Comment document model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brdflow_core::types::id::{CommentId, RequestId, UserId};

/// A document in the `brd_requests/{id}/comments` sub-collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Document key.
    pub id: CommentId,
    /// Parent request.
    pub request_id: RequestId,
    /// Author.
    pub user_id: UserId,
    /// Display name of the author.
    pub user_name: String,
    /// Comment body.
    pub text: String,
    /// Server timestamp. `None` while a write is still pending.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Whether the recipient has read the comment.
    #[serde(default)]
    pub read: bool,
    /// The user this comment is addressed to, if any.
    #[serde(default)]
    pub recipient_id: Option<UserId>,
}

impl Comment {
    /// Whether this comment was written by `user_id`.
    pub fn is_authored_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// Whether this comment explicitly names `user_id` as its recipient.
    pub fn is_addressed_to(&self, user_id: &UserId) -> bool {
        self.recipient_id.as_ref() == Some(user_id)
    }
}

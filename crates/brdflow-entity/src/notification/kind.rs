//! Notification source variants.

use serde::{Deserialize, Serialize};

use brdflow_core::types::id::{CommentId, UserId};

use crate::request::RequestStatus;

/// What produced a notification, with the fields only that source carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    /// A comment addressed to the viewer. Its read flag is persisted on the
    /// comment document.
    Comment {
        /// The comment document the notification was built from.
        #[serde(rename = "commentId")]
        comment_id: CommentId,
        /// Author of the comment.
        #[serde(rename = "userId")]
        user_id: UserId,
        /// Display name of the author.
        #[serde(rename = "userName")]
        user_name: String,
    },
    /// A status change on a request the viewer created. Read state is local
    /// only.
    Status {
        /// The status that triggered the notification.
        status: RequestStatus,
    },
}

impl NotificationKind {
    /// The comment document whose `read` flag mirrors this notification.
    /// `None` for kinds whose read state is local only.
    pub fn persisted_comment(&self) -> Option<&CommentId> {
        match self {
            Self::Comment { comment_id, .. } => Some(comment_id),
            Self::Status { .. } => None,
        }
    }
}

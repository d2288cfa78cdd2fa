//! The document store interface.

use async_trait::async_trait;

use brdflow_core::result::AppResult;
use brdflow_core::types::id::{CommentId, RequestId};
use brdflow_entity::comment::Comment;
use brdflow_entity::request::BrdRequest;

use crate::live::LiveQuery;
use crate::query::{CommentQuery, RequestFilter};

/// Reads and writes against the `brd_requests` collection and its
/// `comments` sub-collections.
///
/// Live reads return a [`LiveQuery`] whose emissions are the full result
/// set each time a matching document changes. Dropping the handle cancels
/// the query.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// One-shot read of the requests matching `filter`.
    async fn find_requests(&self, filter: &RequestFilter) -> AppResult<Vec<BrdRequest>>;

    /// Live read of the requests matching `filter`.
    async fn watch_requests(&self, filter: RequestFilter) -> AppResult<LiveQuery<BrdRequest>>;

    /// Live read of one request's comments, newest first.
    async fn watch_comments(
        &self,
        request_id: &RequestId,
        query: CommentQuery,
    ) -> AppResult<LiveQuery<Comment>>;

    /// Point write setting `read: true` on a comment.
    async fn mark_comment_read(&self, request_id: &RequestId, comment_id: &CommentId)
    -> AppResult<()>;
}

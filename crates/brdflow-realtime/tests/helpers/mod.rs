//! Shared fixtures for feed integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use brdflow_core::config::{NotificationConfig, StoreConfig};
use brdflow_core::result::AppResult;
use brdflow_core::traits::navigator::Navigator;
use brdflow_core::types::id::{CommentId, RequestId, UserId};
use brdflow_database::live::LiveQuery;
use brdflow_database::memory::MemoryDocumentStore;
use brdflow_database::query::{CommentQuery, RequestFilter};
use brdflow_database::store::DocumentStore;
use brdflow_entity::comment::Comment;
use brdflow_entity::request::{BrdRequest, RequestStatus};
use brdflow_realtime::{FeedSnapshot, NotificationFeed, SubscriptionKey, SubscriptionState};

pub const REQUESTER: &str = "req-1";
pub const ANALYST: &str = "ba-1";

/// Memory store that counts comment read writes.
#[derive(Clone)]
pub struct RecordingStore {
    pub inner: MemoryDocumentStore,
    pub read_writes: Arc<AtomicUsize>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryDocumentStore::new(&StoreConfig::default()),
            read_writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn writes(&self) -> usize {
        self.read_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn find_requests(&self, filter: &RequestFilter) -> AppResult<Vec<BrdRequest>> {
        self.inner.find_requests(filter).await
    }

    async fn watch_requests(&self, filter: RequestFilter) -> AppResult<LiveQuery<BrdRequest>> {
        self.inner.watch_requests(filter).await
    }

    async fn watch_comments(
        &self,
        request_id: &RequestId,
        query: CommentQuery,
    ) -> AppResult<LiveQuery<Comment>> {
        self.inner.watch_comments(request_id, query).await
    }

    async fn mark_comment_read(
        &self,
        request_id: &RequestId,
        comment_id: &CommentId,
    ) -> AppResult<()> {
        self.read_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.mark_comment_read(request_id, comment_id).await
    }
}

/// Navigator that records every request it is asked to open.
#[derive(Default)]
pub struct RecordingNavigator {
    pub opened: Mutex<Vec<RequestId>>,
}

impl RecordingNavigator {
    pub fn opened(&self) -> Vec<RequestId> {
        self.opened.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn open_request(&self, request_id: &RequestId) {
        self.opened.lock().unwrap().push(request_id.clone());
    }
}

pub struct TestFeed {
    pub store: RecordingStore,
    pub navigator: Arc<RecordingNavigator>,
    pub feed: NotificationFeed,
}

impl TestFeed {
    pub fn new() -> Self {
        Self::with_config(NotificationConfig::default())
    }

    pub fn with_config(config: NotificationConfig) -> Self {
        let store = RecordingStore::new();
        let navigator = Arc::new(RecordingNavigator::default());
        let feed = NotificationFeed::new(
            Arc::new(store.clone()),
            navigator.clone(),
            config,
        );
        Self {
            store,
            navigator,
            feed,
        }
    }

    /// Wait until a published snapshot satisfies `pred`.
    pub async fn wait_for<F>(&self, pred: F) -> FeedSnapshot
    where
        F: FnMut(&FeedSnapshot) -> bool,
    {
        let mut rx = self.feed.updates();
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
            .await
            .expect("timed out waiting for feed snapshot")
            .expect("feed snapshot channel closed");
        snapshot.clone()
    }

    /// Wait until the subscription `key` reports `state`.
    pub async fn wait_for_state(&self, key: &SubscriptionKey, state: SubscriptionState) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let states = self.feed.subscription_states().await;
                if states.iter().any(|(k, s)| k == key && *s == state) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("subscription did not reach the expected state");
    }

    /// Wait until every store-side live query has stopped.
    pub async fn wait_for_released(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.store.inner.active_live_queries() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("live queries should be released");
    }
}

pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::minutes(minutes)
}

pub fn request(id: &str, created_by: &str, analyst: Option<&str>, status: RequestStatus) -> BrdRequest {
    BrdRequest {
        id: RequestId::new(id),
        project_name: format!("Project {id}"),
        created_by: UserId::new(created_by),
        assigned_analyst_id: analyst.map(UserId::new),
        status,
        updated_at: minutes_ago(30),
    }
}

pub fn comment(id: &str, request_id: &str, author: &str, recipient: Option<&str>, age_minutes: i64) -> Comment {
    Comment {
        id: CommentId::new(id),
        request_id: RequestId::new(request_id),
        user_id: UserId::new(author),
        user_name: format!("User {author}"),
        text: format!("Comment {id}"),
        timestamp: Some(minutes_ago(age_minutes)),
        read: false,
        recipient_id: recipient.map(UserId::new),
    }
}

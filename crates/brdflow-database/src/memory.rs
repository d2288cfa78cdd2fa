//! In-process document store with live queries.
//!
//! Holds the `brd_requests` collection and its comment sub-collections in
//! memory. Every write broadcasts a change; each live query runs as its
//! own task that re-evaluates on relevant changes and exits once the
//! subscriber drops its [`LiveQuery`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::{debug, trace};

use brdflow_core::config::StoreConfig;
use brdflow_core::error::AppError;
use brdflow_core::result::AppResult;
use brdflow_core::types::id::{CommentId, RequestId, UserId};
use brdflow_entity::comment::Comment;
use brdflow_entity::request::{BrdRequest, RequestStatus};

use crate::live::LiveQuery;
use crate::query::{CommentQuery, RequestFilter, sort_newest_first};
use crate::store::DocumentStore;

/// Which documents a write touched.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreChange {
    Request(RequestId),
    Comments(RequestId),
}

#[derive(Debug, Default)]
struct StoreData {
    requests: BTreeMap<RequestId, BrdRequest>,
    comments: HashMap<RequestId, Vec<Comment>>,
    /// Requests whose comments the current principal may not read.
    revoked: HashSet<RequestId>,
    read_only: bool,
}

#[derive(Debug)]
struct StoreState {
    data: RwLock<StoreData>,
    changes: broadcast::Sender<StoreChange>,
    live_queries: AtomicUsize,
    live_buffer_size: usize,
}

/// Decrements the live-query counter when a query task exits.
struct LiveGuard(Arc<StoreState>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.live_queries.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory implementation of [`DocumentStore`]. Cloning shares state.
#[derive(Debug, Clone)]
pub struct MemoryDocumentStore {
    state: Arc<StoreState>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new(config: &StoreConfig) -> Self {
        let (changes, _) = broadcast::channel(config.change_buffer_size.max(1));
        Self {
            state: Arc::new(StoreState {
                data: RwLock::new(StoreData::default()),
                changes,
                live_queries: AtomicUsize::new(0),
                live_buffer_size: config.live_buffer_size.max(1),
            }),
        }
    }

    /// Insert or replace a request document.
    pub async fn insert_request(&self, request: BrdRequest) -> AppResult<()> {
        let id = request.id.clone();
        {
            let mut data = self.state.data.write().await;
            ensure_writable(&data)?;
            data.requests.insert(id.clone(), request);
        }
        self.notify(StoreChange::Request(id));
        Ok(())
    }

    /// Change a request's status and bump `updatedAt`.
    pub async fn update_status(&self, request_id: &RequestId, status: RequestStatus) -> AppResult<()> {
        {
            let mut data = self.state.data.write().await;
            ensure_writable(&data)?;
            let request = data
                .requests
                .get_mut(request_id)
                .ok_or_else(|| AppError::not_found(format!("Request '{request_id}' not found")))?;
            request.status = status;
            request.updated_at = Utc::now();
        }
        self.notify(StoreChange::Request(request_id.clone()));
        Ok(())
    }

    /// Assign a request to an analyst and bump `updatedAt`.
    pub async fn assign_analyst(&self, request_id: &RequestId, analyst: UserId) -> AppResult<()> {
        {
            let mut data = self.state.data.write().await;
            ensure_writable(&data)?;
            let request = data
                .requests
                .get_mut(request_id)
                .ok_or_else(|| AppError::not_found(format!("Request '{request_id}' not found")))?;
            request.assigned_analyst_id = Some(analyst);
            request.updated_at = Utc::now();
        }
        self.notify(StoreChange::Request(request_id.clone()));
        Ok(())
    }

    /// Add a comment under its parent request.
    pub async fn add_comment(&self, comment: Comment) -> AppResult<()> {
        let request_id = comment.request_id.clone();
        {
            let mut data = self.state.data.write().await;
            ensure_writable(&data)?;
            if !data.requests.contains_key(&request_id) {
                return Err(AppError::not_found(format!(
                    "Request '{request_id}' not found"
                )));
            }
            let comments = data.comments.entry(request_id.clone()).or_default();
            comments.retain(|c| c.id != comment.id);
            comments.push(comment);
        }
        self.notify(StoreChange::Comments(request_id));
        Ok(())
    }

    /// Look up a single comment.
    pub async fn comment(&self, request_id: &RequestId, comment_id: &CommentId) -> Option<Comment> {
        let data = self.state.data.read().await;
        data.comments
            .get(request_id)
            .and_then(|list| list.iter().find(|c| &c.id == comment_id))
            .cloned()
    }

    /// Deny comment reads and writes for a request. Open live queries on
    /// that request fail on their next evaluation.
    pub async fn revoke_access(&self, request_id: &RequestId) {
        self.state
            .data
            .write()
            .await
            .revoked
            .insert(request_id.clone());
        self.notify(StoreChange::Comments(request_id.clone()));
    }

    /// Reject (or allow again) every write.
    pub async fn set_read_only(&self, read_only: bool) {
        self.state.data.write().await.read_only = read_only;
    }

    /// Number of live-query tasks still running.
    pub fn active_live_queries(&self) -> usize {
        self.state.live_queries.load(Ordering::SeqCst)
    }

    fn notify(&self, change: StoreChange) {
        trace!(?change, "Document store change");
        // No receivers simply means no live queries are open.
        let _ = self.state.changes.send(change);
    }

    /// Start a live-query task.
    ///
    /// The change receiver is created before the initial evaluation so no
    /// write between the two is missed. The task stops after emitting an
    /// error, when the subscriber drops its handle, or when the store goes
    /// away.
    fn spawn_live<T, R, Q>(&self, relevant: R, query: Q) -> LiveQuery<T>
    where
        T: Send + 'static,
        R: Fn(&StoreChange) -> bool + Send + Sync + 'static,
        Q: Fn(&StoreData) -> AppResult<Vec<T>> + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel(self.state.live_buffer_size);
        let state = Arc::clone(&self.state);
        let mut changes = state.changes.subscribe();

        state.live_queries.fetch_add(1, Ordering::SeqCst);
        let guard = LiveGuard(Arc::clone(&state));

        tokio::spawn(async move {
            let _guard = guard;
            loop {
                let result = query(&*state.data.read().await);
                let failed = result.is_err();
                if tx.send(result).await.is_err() || failed {
                    break;
                }

                loop {
                    tokio::select! {
                        _ = tx.closed() => return,
                        change = changes.recv() => match change {
                            Ok(change) if relevant(&change) => break,
                            Ok(_) => continue,
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                debug!(skipped, "Live query lagged, re-evaluating");
                                break;
                            }
                            Err(broadcast::error::RecvError::Closed) => return,
                        },
                    }
                }
            }
        });

        LiveQuery::new(rx)
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

fn ensure_writable(data: &StoreData) -> AppResult<()> {
    if data.read_only {
        return Err(AppError::authorization("Document store is read-only"));
    }
    Ok(())
}

fn ensure_readable(data: &StoreData, request_id: &RequestId) -> AppResult<()> {
    if data.revoked.contains(request_id) {
        return Err(AppError::authorization(format!(
            "Missing or insufficient permissions for comments of request '{request_id}'"
        )));
    }
    Ok(())
}

fn select_requests(data: &StoreData, filter: &RequestFilter) -> Vec<BrdRequest> {
    let mut rows: Vec<BrdRequest> = data
        .requests
        .values()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    rows
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_requests(&self, filter: &RequestFilter) -> AppResult<Vec<BrdRequest>> {
        let data = self.state.data.read().await;
        Ok(select_requests(&data, filter))
    }

    async fn watch_requests(&self, filter: RequestFilter) -> AppResult<LiveQuery<BrdRequest>> {
        Ok(self.spawn_live(
            |change| matches!(change, StoreChange::Request(_)),
            move |data| Ok(select_requests(data, &filter)),
        ))
    }

    async fn watch_comments(
        &self,
        request_id: &RequestId,
        query: CommentQuery,
    ) -> AppResult<LiveQuery<Comment>> {
        ensure_readable(&*self.state.data.read().await, request_id)?;

        let watched = request_id.clone();
        let key = request_id.clone();
        Ok(self.spawn_live(
            move |change| matches!(change, StoreChange::Comments(id) if *id == watched),
            move |data| {
                ensure_readable(data, &key)?;
                let mut rows: Vec<Comment> = data
                    .comments
                    .get(&key)
                    .map(|list| list.iter().filter(|c| query.matches(c)).cloned().collect())
                    .unwrap_or_default();
                sort_newest_first(&mut rows);
                Ok(rows)
            },
        ))
    }

    async fn mark_comment_read(
        &self,
        request_id: &RequestId,
        comment_id: &CommentId,
    ) -> AppResult<()> {
        {
            let mut data = self.state.data.write().await;
            ensure_writable(&data)?;
            ensure_readable(&data, request_id)?;
            let comment = data
                .comments
                .get_mut(request_id)
                .and_then(|list| list.iter_mut().find(|c| &c.id == comment_id))
                .ok_or_else(|| {
                    AppError::not_found(format!(
                        "Comment '{comment_id}' not found under request '{request_id}'"
                    ))
                })?;
            comment.read = true;
        }
        self.notify(StoreChange::Comments(request_id.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brdflow_core::error::ErrorKind;
    use chrono::DateTime;
    use std::time::Duration;

    fn request(id: &str, created_by: &str) -> BrdRequest {
        BrdRequest::new(RequestId::new(id), format!("Project {id}"), UserId::new(created_by))
    }

    fn comment(id: &str, request_id: &str, ts: i64) -> Comment {
        Comment {
            id: CommentId::new(id),
            request_id: RequestId::new(request_id),
            user_id: UserId::new("ba-1"),
            user_name: "Analyst".to_string(),
            text: format!("comment {id}"),
            timestamp: DateTime::from_timestamp(ts, 0),
            read: false,
            recipient_id: Some(UserId::new("req-1")),
        }
    }

    async fn wait_for_idle(store: &MemoryDocumentStore) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while store.active_live_queries() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("live queries should stop");
    }

    #[tokio::test]
    async fn test_find_requests_by_creator() {
        let store = MemoryDocumentStore::default();
        store.insert_request(request("r1", "alice")).await.unwrap();
        store.insert_request(request("r2", "bob")).await.unwrap();

        let rows = store
            .find_requests(&RequestFilter::created_by(UserId::new("alice")))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.as_str(), "r1");
    }

    #[tokio::test]
    async fn test_watch_comments_emits_initial_and_updates() {
        let store = MemoryDocumentStore::default();
        store.insert_request(request("r1", "req-1")).await.unwrap();
        store.add_comment(comment("c1", "r1", 100)).await.unwrap();

        let mut live = store
            .watch_comments(&RequestId::new("r1"), CommentQuery::since(DateTime::<Utc>::UNIX_EPOCH))
            .await
            .unwrap();
        let initial = live.next().await.unwrap().unwrap();
        assert_eq!(initial.len(), 1);

        store.add_comment(comment("c2", "r1", 200)).await.unwrap();
        let update = live.next().await.unwrap().unwrap();
        let ids: Vec<&str> = update.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[tokio::test]
    async fn test_revoked_request_fails_setup() {
        let store = MemoryDocumentStore::default();
        store.insert_request(request("r1", "req-1")).await.unwrap();
        store.revoke_access(&RequestId::new("r1")).await;

        let err = store
            .watch_comments(&RequestId::new("r1"), CommentQuery::since(DateTime::<Utc>::UNIX_EPOCH))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_revocation_terminates_open_query() {
        let store = MemoryDocumentStore::default();
        store.insert_request(request("r1", "req-1")).await.unwrap();
        let mut live = store
            .watch_comments(&RequestId::new("r1"), CommentQuery::since(DateTime::<Utc>::UNIX_EPOCH))
            .await
            .unwrap();
        live.next().await.unwrap().unwrap();

        store.revoke_access(&RequestId::new("r1")).await;
        assert!(live.next().await.unwrap().is_err());
        assert!(live.next().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_live_request_query_on_worker_thread() {
        let store = MemoryDocumentStore::default();
        store.insert_request(request("r1", "req-1")).await.unwrap();

        let watcher = store.clone();
        let seen_both = tokio::spawn(async move {
            let mut live = watcher
                .watch_requests(RequestFilter::created_by(UserId::new("req-1")))
                .await
                .unwrap();
            while let Some(Ok(rows)) = live.next().await {
                if rows.len() == 2 {
                    return true;
                }
            }
            false
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.insert_request(request("r2", "req-1")).await.unwrap();

        let seen = tokio::time::timeout(Duration::from_secs(2), seen_both)
            .await
            .expect("live query should emit")
            .unwrap();
        assert!(seen);
    }

    #[tokio::test]
    async fn test_dropping_query_stops_task() {
        let store = MemoryDocumentStore::default();
        let live = store.watch_requests(RequestFilter::default()).await.unwrap();
        assert_eq!(store.active_live_queries(), 1);

        live.cancel();
        wait_for_idle(&store).await;
        assert_eq!(store.active_live_queries(), 0);
    }

    #[tokio::test]
    async fn test_mark_comment_read_persists() {
        let store = MemoryDocumentStore::default();
        store.insert_request(request("r1", "req-1")).await.unwrap();
        store.add_comment(comment("c1", "r1", 100)).await.unwrap();

        store
            .mark_comment_read(&RequestId::new("r1"), &CommentId::new("c1"))
            .await
            .unwrap();
        let stored = store
            .comment(&RequestId::new("r1"), &CommentId::new("c1"))
            .await
            .unwrap();
        assert!(stored.read);
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let store = MemoryDocumentStore::default();
        store.insert_request(request("r1", "req-1")).await.unwrap();
        store.add_comment(comment("c1", "r1", 100)).await.unwrap();
        store.set_read_only(true).await;

        let err = store
            .mark_comment_read(&RequestId::new("r1"), &CommentId::new("c1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
}

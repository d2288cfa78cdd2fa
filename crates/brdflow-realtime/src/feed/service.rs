//! Session-scoped notification feed with an explicit start/stop lifecycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use brdflow_core::config::NotificationConfig;
use brdflow_core::error::AppError;
use brdflow_core::result::AppResult;
use brdflow_core::traits::navigator::Navigator;
use brdflow_core::types::id::{NotificationId, RequestId, UserId};
use brdflow_database::query::RequestFilter;
use brdflow_database::store::DocumentStore;
use brdflow_entity::request::BrdRequest;

use crate::notification::builder::CandidateBuilder;
use crate::notification::reconciler::NotificationReconciler;
use crate::notification::sync::{PendingWrites, ReadStateSynchronizer};
use crate::subscription::key::{SubscriptionKey, SubscriptionState};
use crate::subscription::registry::SubscriptionRegistry;
use crate::subscription::watcher::{self, WatchContext, WatchedRequest};

use super::aggregator::{self, FeedEvent};
use super::linker;
use super::snapshot::FeedSnapshot;

pub(super) type SharedSession = Arc<Mutex<Option<FeedSession>>>;

/// State that exists only while the feed is running for a viewer.
pub(super) struct FeedSession {
    pub(super) viewer: UserId,
    /// Linked requests and their project names at open time.
    watched: BTreeMap<RequestId, String>,
    registry: SubscriptionRegistry,
    events: mpsc::Sender<FeedEvent>,
    aggregator: JoinHandle<()>,
    linker_token: CancellationToken,
    linker: JoinHandle<()>,
}

/// Store access and settings needed to (re)open a session's subscriptions.
#[derive(Clone)]
pub(super) struct SessionContext {
    store: Arc<dyn DocumentStore>,
    config: NotificationConfig,
}

/// The viewer's live notification feed.
///
/// Call [`start`](Self::start) once the viewer is known and
/// [`stop`](Self::stop) on logout. While running, one watcher per linked
/// request and one status watcher feed a single aggregator task; readers
/// observe the result through [`snapshot`](Self::snapshot) or
/// [`updates`](Self::updates).
pub struct NotificationFeed {
    ctx: SessionContext,
    navigator: Arc<dyn Navigator>,
    sync: ReadStateSynchronizer,
    session: SharedSession,
    snapshots: Arc<watch::Sender<FeedSnapshot>>,
    /// Parent of every session's linker token.
    root: CancellationToken,
}

impl std::fmt::Debug for NotificationFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFeed")
            .field("config", &self.ctx.config)
            .finish()
    }
}

impl NotificationFeed {
    /// Create a stopped feed.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        navigator: Arc<dyn Navigator>,
        config: NotificationConfig,
    ) -> Self {
        let (snapshots, _) = watch::channel(FeedSnapshot::default());
        Self {
            sync: ReadStateSynchronizer::new(Arc::clone(&store)),
            ctx: SessionContext { store, config },
            navigator,
            session: Arc::new(Mutex::new(None)),
            snapshots: Arc::new(snapshots),
            root: CancellationToken::new(),
        }
    }

    /// Start the feed for `viewer`.
    ///
    /// Starting for another viewer first stops the running session and
    /// discards its notifications. Starting again for the same viewer is a
    /// [`refresh`](Self::refresh).
    pub async fn start(&self, viewer: UserId) {
        let mut guard = self.session.lock().await;

        if let Some(session) = guard.as_mut() {
            if session.viewer == viewer {
                self.ctx.reopen_if_changed(session).await;
                return;
            }
        }
        if let Some(previous) = guard.take() {
            self.shutdown(previous).await;
        }

        let config = &self.ctx.config;
        let (events, rx) = mpsc::channel(config.event_buffer_size.max(1));
        let aggregator = tokio::spawn(aggregator::run(
            NotificationReconciler::new(config.max_items),
            rx,
            Arc::clone(&self.snapshots),
        ));

        let watched = self.ctx.linked_requests(&viewer).await;
        let linker_token = self.root.child_token();
        let linker = linker::spawn(
            self.ctx.clone(),
            Arc::clone(&self.session),
            viewer.clone(),
            linker_token.clone(),
        );
        let mut session = FeedSession {
            viewer,
            watched,
            registry: SubscriptionRegistry::new(),
            events,
            aggregator,
            linker_token,
            linker,
        };
        self.ctx.open_subscriptions(&mut session);

        info!(
            viewer = %session.viewer,
            requests = session.watched.len(),
            "Notification feed started"
        );
        *guard = Some(session);
    }

    /// Recompute the viewer's linked requests and, if the set changed,
    /// cancel every subscription and reopen them. Notifications already in
    /// the feed are kept. Returns whether the subscriptions were reopened.
    ///
    /// A running feed also does this on its own whenever a request created
    /// by or assigned to the viewer appears or disappears.
    pub async fn refresh(&self) -> bool {
        let mut guard = self.session.lock().await;
        match guard.as_mut() {
            Some(session) => self.ctx.reopen_if_changed(session).await,
            None => false,
        }
    }

    /// Cancel every subscription, wait for all tasks to finish, and clear
    /// the feed.
    pub async fn stop(&self) {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            self.shutdown(session).await;
        }
    }

    /// Whether the feed is running.
    pub async fn is_running(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// The viewer the feed is running for.
    pub async fn viewer(&self) -> Option<UserId> {
        self.session.lock().await.as_ref().map(|s| s.viewer.clone())
    }

    /// Requests currently watched for comments.
    pub async fn watched_requests(&self) -> Vec<WatchedRequest> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| {
                s.watched
                    .iter()
                    .map(|(id, name)| WatchedRequest {
                        id: id.clone(),
                        name: name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Loading state of every open subscription.
    pub async fn subscription_states(&self) -> Vec<(SubscriptionKey, SubscriptionState)> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.registry.states())
            .unwrap_or_default()
    }

    /// Whether any subscription is still waiting for its first result.
    pub async fn is_loading(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| s.registry.is_loading())
    }

    /// Current notifications and unread count.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn updates(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshots.subscribe()
    }

    /// Mark one notification read and open its request.
    ///
    /// The feed is updated before this returns. For a comment notification
    /// a write-back is started; the returned handle may be awaited or
    /// dropped, and a failed write never reverts the local state.
    pub async fn mark_read(&self, id: &NotificationId) -> AppResult<PendingWrites> {
        let events = self.events().await?;
        let (reply, rx) = oneshot::channel();
        events
            .send(FeedEvent::MarkRead {
                id: id.clone(),
                reply,
            })
            .await
            .map_err(|_| not_running())?;

        let marked = rx
            .await
            .map_err(|_| not_running())?
            .ok_or_else(|| AppError::not_found(format!("Notification '{id}' not found")))?;

        self.navigator.open_request(&marked.notification.request_id);
        Ok(self.sync.persist(std::slice::from_ref(&marked.notification)))
    }

    /// Mark every notification read.
    ///
    /// Starts one concurrent write-back per comment notification that was
    /// unread; status notifications are only marked locally.
    pub async fn mark_all_read(&self) -> AppResult<PendingWrites> {
        let events = self.events().await?;
        let (reply, rx) = oneshot::channel();
        events
            .send(FeedEvent::MarkAllRead { reply })
            .await
            .map_err(|_| not_running())?;

        let changed = rx.await.map_err(|_| not_running())?;
        Ok(self.sync.persist(&changed))
    }

    async fn events(&self) -> AppResult<mpsc::Sender<FeedEvent>> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.events.clone())
            .ok_or_else(not_running)
    }

    async fn shutdown(&self, session: FeedSession) {
        let FeedSession {
            viewer,
            mut registry,
            events,
            aggregator,
            linker_token,
            linker,
            ..
        } = session;

        linker_token.cancel();
        registry.close_all().await;
        drop(events);
        if let Err(e) = aggregator.await {
            error!("Notification aggregator failed: {}", e);
        }
        if let Err(e) = linker.await {
            error!("Linked-request watcher failed: {}", e);
        }

        self.snapshots.send_replace(FeedSnapshot::default());
        info!(viewer = %viewer, "Notification feed stopped");
    }
}

impl Drop for NotificationFeed {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

impl SessionContext {
    pub(super) fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Requests the viewer created or is assigned to, keyed by id.
    ///
    /// A failed lookup is logged and contributes nothing.
    async fn linked_requests(&self, viewer: &UserId) -> BTreeMap<RequestId, String> {
        let mut linked = BTreeMap::new();
        for filter in [
            RequestFilter::assigned_to(viewer.clone()),
            RequestFilter::created_by(viewer.clone()),
        ] {
            match self.store.find_requests(&filter).await {
                Ok(rows) => extend_linked(&mut linked, rows),
                Err(e) => {
                    warn!(viewer = %viewer, error = %e, "Failed to load linked requests");
                }
            }
        }
        linked
    }

    fn open_subscriptions(&self, session: &mut FeedSession) {
        let ctx = WatchContext {
            store: Arc::clone(&self.store),
            builder: CandidateBuilder::new(
                session.viewer.clone(),
                Utc::now() - self.config.lookback(),
            ),
            events: session.events.clone(),
        };

        for (id, name) in &session.watched {
            let ctx = ctx.clone();
            let request = WatchedRequest {
                id: id.clone(),
                name: name.clone(),
            };
            session
                .registry
                .open(SubscriptionKey::Comments(id.clone()), move |token, reporter| {
                    watcher::watch_comments(ctx, request, token, reporter)
                });
        }

        session
            .registry
            .open(SubscriptionKey::RequestStatus, move |token, reporter| {
                watcher::watch_status(ctx, token, reporter)
            });
    }

    async fn reopen_if_changed(&self, session: &mut FeedSession) -> bool {
        let linked = self.linked_requests(&session.viewer).await;
        self.relink(session, linked).await
    }

    /// Remount every subscription if `linked` differs from the watched set.
    pub(super) async fn relink(
        &self,
        session: &mut FeedSession,
        linked: BTreeMap<RequestId, String>,
    ) -> bool {
        if linked.keys().eq(session.watched.keys()) {
            return false;
        }

        session.registry.close_all().await;
        info!(
            viewer = %session.viewer,
            before = session.watched.len(),
            after = linked.len(),
            "Linked requests changed, reopening subscriptions"
        );
        session.watched = linked;
        self.open_subscriptions(session);
        true
    }
}

/// Add `rows` to `linked`, keeping the first name seen for each request.
pub(super) fn extend_linked(
    linked: &mut BTreeMap<RequestId, String>,
    rows: impl IntoIterator<Item = BrdRequest>,
) {
    for request in rows {
        linked.entry(request.id).or_insert(request.project_name);
    }
}

fn not_running() -> AppError {
    AppError::service_unavailable("Notification feed is not running")
}

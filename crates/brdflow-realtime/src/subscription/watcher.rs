//! Watcher tasks: turn live-query emissions into notification batches.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use brdflow_core::types::id::RequestId;
use brdflow_database::live::LiveQuery;
use brdflow_database::query::{CommentQuery, RequestFilter};
use brdflow_database::store::DocumentStore;
use brdflow_entity::notification::Notification;
use brdflow_entity::request::RequestStatus;

use crate::feed::aggregator::FeedEvent;
use crate::notification::builder::CandidateBuilder;

use super::registry::StateReporter;

/// A request whose comments are watched, with its project name as known
/// when the subscription was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedRequest {
    /// Request key.
    pub id: RequestId,
    /// Project name snapshot.
    pub name: String,
}

/// Everything a watcher needs, shared by all watchers of a session.
#[derive(Clone)]
pub(crate) struct WatchContext {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) builder: CandidateBuilder,
    pub(crate) events: mpsc::Sender<FeedEvent>,
}

/// Watch one request's comments from the start of the lookback window.
pub(crate) async fn watch_comments(
    ctx: WatchContext,
    request: WatchedRequest,
    token: CancellationToken,
    reporter: StateReporter,
) {
    let query = CommentQuery::since(ctx.builder.since());
    let setup = tokio::select! {
        _ = token.cancelled() => return,
        setup = ctx.store.watch_comments(&request.id, query) => setup,
    };

    let live = match setup {
        Ok(live) => live,
        Err(e) => {
            warn!(
                subscription = %reporter.key(),
                error = %e,
                "Failed to open comment subscription"
            );
            reporter.failed();
            return;
        }
    };

    let builder = ctx.builder.clone();
    drive(live, &ctx.events, &token, &reporter, |rows| {
        builder.comments(&rows, &request.name)
    })
    .await;
}

/// Watch status changes on requests the viewer created.
pub(crate) async fn watch_status(
    ctx: WatchContext,
    token: CancellationToken,
    reporter: StateReporter,
) {
    let filter = RequestFilter::created_by(ctx.builder.viewer().clone())
        .updated_since(ctx.builder.since())
        .excluding_status(RequestStatus::New);

    let setup = tokio::select! {
        _ = token.cancelled() => return,
        setup = ctx.store.watch_requests(filter) => setup,
    };

    let live = match setup {
        Ok(live) => live,
        Err(e) => {
            warn!(
                subscription = %reporter.key(),
                error = %e,
                "Failed to open status subscription"
            );
            reporter.failed();
            return;
        }
    };

    let builder = ctx.builder.clone();
    drive(live, &ctx.events, &token, &reporter, |rows| {
        builder.statuses(&rows)
    })
    .await;
}

/// Forward emissions until cancelled, the query fails, or the store or
/// aggregator goes away. The live query is released on return.
async fn drive<T, F>(
    mut live: LiveQuery<T>,
    events: &mpsc::Sender<FeedEvent>,
    token: &CancellationToken,
    reporter: &StateReporter,
    map: F,
) where
    F: Fn(Vec<T>) -> Vec<Notification>,
{
    loop {
        let emission = tokio::select! {
            _ = token.cancelled() => break,
            emission = live.next() => emission,
        };

        match emission {
            Some(Ok(rows)) => {
                reporter.live();
                let event = FeedEvent::Batch {
                    source: reporter.key().clone(),
                    notifications: map(rows),
                };
                let sent = tokio::select! {
                    _ = token.cancelled() => break,
                    sent = events.send(event) => sent,
                };
                if sent.is_err() {
                    debug!(subscription = %reporter.key(), "Aggregator gone, stopping watcher");
                    break;
                }
            }
            Some(Err(e)) => {
                warn!(
                    subscription = %reporter.key(),
                    error = %e,
                    "Live query failed"
                );
                reporter.failed();
                break;
            }
            None => {
                debug!(subscription = %reporter.key(), "Live query closed by store");
                break;
            }
        }
    }
    trace!(subscription = %reporter.key(), "Watcher released");
}

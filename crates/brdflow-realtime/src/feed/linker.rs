//! Follows the viewer's linked requests and remounts the session's
//! subscriptions when that set changes.

use std::collections::BTreeMap;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use brdflow_core::types::id::UserId;
use brdflow_database::query::RequestFilter;
use brdflow_entity::request::BrdRequest;

use super::service::{SessionContext, SharedSession, extend_linked};

pub(super) fn spawn(
    ctx: SessionContext,
    session: SharedSession,
    viewer: UserId,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run(ctx, session, viewer, token))
}

async fn run(
    ctx: SessionContext,
    session: SharedSession,
    viewer: UserId,
    token: CancellationToken,
) {
    let store = ctx.store();
    let setup = tokio::select! {
        _ = token.cancelled() => return,
        setup = async {
            tokio::join!(
                store.watch_requests(RequestFilter::assigned_to(viewer.clone())),
                store.watch_requests(RequestFilter::created_by(viewer.clone())),
            )
        } => setup,
    };
    let (mut assigned, mut created) = match setup {
        (Ok(assigned), Ok(created)) => (assigned, created),
        (Err(e), _) | (_, Err(e)) => {
            warn!(viewer = %viewer, error = %e, "Failed to watch linked requests");
            return;
        }
    };

    let mut latest_assigned: Option<Vec<BrdRequest>> = None;
    let mut latest_created: Option<Vec<BrdRequest>> = None;

    loop {
        let (is_assigned, emission) = tokio::select! {
            _ = token.cancelled() => break,
            emission = assigned.next() => (true, emission),
            emission = created.next() => (false, emission),
        };

        let rows = match emission {
            Some(Ok(rows)) => rows,
            Some(Err(e)) => {
                warn!(viewer = %viewer, error = %e, "Linked-request query failed");
                break;
            }
            None => break,
        };
        if is_assigned {
            latest_assigned = Some(rows);
        } else {
            latest_created = Some(rows);
        }

        // Both queries must have reported before the union is complete.
        let (Some(by_analyst), Some(by_creator)) = (&latest_assigned, &latest_created) else {
            continue;
        };
        let mut linked = BTreeMap::new();
        extend_linked(&mut linked, by_analyst.iter().cloned());
        extend_linked(&mut linked, by_creator.iter().cloned());

        let mut guard = tokio::select! {
            _ = token.cancelled() => break,
            guard = session.lock() => guard,
        };
        // The session may have been replaced while waiting for the lock.
        if token.is_cancelled() {
            break;
        }
        match guard.as_mut() {
            Some(current) if current.viewer == viewer => {
                ctx.relink(current, linked).await;
            }
            _ => break,
        }
    }
    debug!(viewer = %viewer, "Linked-request watcher stopped");
}

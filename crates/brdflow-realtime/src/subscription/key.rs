//! Subscription identity and loading state.

use std::fmt;

use serde::Serialize;

use brdflow_core::types::id::RequestId;

/// Identifies one live subscription of a feed session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "requestId", rename_all = "snake_case")]
pub enum SubscriptionKey {
    /// Comments of one request.
    Comments(RequestId),
    /// Status changes over the requests the viewer created.
    RequestStatus,
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comments(id) => write!(f, "comments:{id}"),
            Self::RequestStatus => write!(f, "request_status"),
        }
    }
}

/// Loading flag of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    /// Opened, no emission received yet.
    Loading,
    /// At least one emission received.
    Live,
    /// Setup or a later emission failed. Stays failed until the session
    /// is restarted.
    Failed,
}

impl SubscriptionState {
    /// Whether the subscription is still waiting for its first emission.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

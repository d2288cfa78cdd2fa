//! # brdflow-realtime
//!
//! Live notification feed for BRD Flow. Provides:
//!
//! - One live comment subscription per linked request plus one status
//!   stream over the viewer's own requests
//! - Fan-in of every subscription into a single aggregator task
//! - Id-keyed reconciliation with monotonic read state, newest-first
//!   ordering, and a fixed cap
//! - Optimistic read marking with best-effort write-back of comment reads

pub mod feed;
pub mod notification;
pub mod subscription;

pub use feed::{FeedSnapshot, NotificationFeed};
pub use notification::reconciler::NotificationReconciler;
pub use notification::sync::{PendingWrites, ReadStateSynchronizer, WriteSummary};
pub use subscription::{SubscriptionKey, SubscriptionState};

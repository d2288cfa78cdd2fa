//! Live subscription lifecycle: one comment watcher per linked request
//! plus one status watcher, all owned by a registry that cancels them
//! together.

pub mod key;
pub mod registry;
pub mod watcher;

pub use key::{SubscriptionKey, SubscriptionState};
pub use registry::{StateReporter, SubscriptionRegistry};
pub use watcher::WatchedRequest;

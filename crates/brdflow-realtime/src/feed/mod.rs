//! The notification feed service.

pub(crate) mod aggregator;
mod linker;
pub mod service;
pub mod snapshot;

pub use service::NotificationFeed;
pub use snapshot::FeedSnapshot;

//! Notification construction, reconciliation, and read-state sync.

pub mod builder;
pub mod messages;
pub mod reconciler;
pub mod sync;

pub use builder::CandidateBuilder;
pub use reconciler::NotificationReconciler;

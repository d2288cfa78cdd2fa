//! Registry of open subscriptions.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::key::{SubscriptionKey, SubscriptionState};

/// Handle a watcher uses to report its loading state.
#[derive(Debug, Clone)]
pub struct StateReporter {
    key: SubscriptionKey,
    states: Arc<DashMap<SubscriptionKey, SubscriptionState>>,
}

impl StateReporter {
    /// The subscription this reporter belongs to.
    pub fn key(&self) -> &SubscriptionKey {
        &self.key
    }

    /// Record that an emission arrived.
    pub fn live(&self) {
        self.set(SubscriptionState::Live);
    }

    /// Record a failure. Clears the loading flag.
    pub fn failed(&self) {
        self.set(SubscriptionState::Failed);
    }

    fn set(&self, state: SubscriptionState) {
        if let Some(mut entry) = self.states.get_mut(&self.key) {
            *entry = state;
        }
    }
}

/// Owns every watcher task of a feed session.
///
/// Each key is opened at most once until [`close_all`](Self::close_all);
/// a failed subscription is not reopened. All watchers share one root
/// cancellation token, which is also cancelled when the registry is
/// dropped so no watcher outlives its owner.
#[derive(Debug)]
pub struct SubscriptionRegistry {
    root: CancellationToken,
    tasks: HashMap<SubscriptionKey, JoinHandle<()>>,
    states: Arc<DashMap<SubscriptionKey, SubscriptionState>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            tasks: HashMap::new(),
            states: Arc::new(DashMap::new()),
        }
    }

    /// Spawn the watcher for `key` unless it is already open.
    ///
    /// `start` receives a cancellation token and a state reporter and
    /// returns the watcher future. Returns `false` if `key` was already
    /// open in this lifecycle.
    pub fn open<F, Fut>(&mut self, key: SubscriptionKey, start: F) -> bool
    where
        F: FnOnce(CancellationToken, StateReporter) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.tasks.contains_key(&key) {
            debug!(subscription = %key, "Subscription already open");
            return false;
        }

        self.states.insert(key.clone(), SubscriptionState::Loading);
        let reporter = StateReporter {
            key: key.clone(),
            states: Arc::clone(&self.states),
        };
        let handle = tokio::spawn(start(self.root.child_token(), reporter));
        debug!(subscription = %key, "Subscription opened");
        self.tasks.insert(key, handle);
        true
    }

    /// Number of subscriptions opened in this lifecycle.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no subscription is open.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether any subscription is still waiting for its first emission.
    pub fn is_loading(&self) -> bool {
        self.states.iter().any(|entry| entry.value().is_loading())
    }

    /// Loading state of every subscription, ordered by key.
    pub fn states(&self) -> Vec<(SubscriptionKey, SubscriptionState)> {
        let mut states: Vec<_> = self
            .states
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }

    /// Cancel every watcher and wait for all of them to exit.
    ///
    /// The registry is empty and reusable afterwards.
    pub async fn close_all(&mut self) {
        self.root.cancel();
        let count = self.tasks.len();
        for (key, handle) in self.tasks.drain() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!(subscription = %key, "Watcher panicked: {}", e);
                }
            }
        }
        self.states.clear();
        self.root = CancellationToken::new();
        debug!(count, "All subscriptions closed");
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

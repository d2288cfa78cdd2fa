//! Id-keyed merge of notification batches into the viewer's feed.
//!
//! Invariants after every operation:
//! - ids are unique
//! - the list is sorted newest first and holds at most `capacity` entries
//! - a read entry never becomes unread through a merge
//! - the unread counter equals the number of unread entries

use std::collections::HashMap;

use tracing::debug;

use brdflow_core::types::id::NotificationId;
use brdflow_entity::notification::Notification;

/// Default number of notifications kept in the feed.
pub const DEFAULT_CAPACITY: usize = 50;

/// Merge `incoming` into `existing`.
///
/// A candidate whose id is already present replaces that entry's fields,
/// keeping `read` if either side has it set. New ids are appended. The
/// result is sorted by timestamp, newest first (ties by id), truncated to `capacity`,
/// and returned with its unread count.
pub fn merge(
    existing: Vec<Notification>,
    incoming: Vec<Notification>,
    capacity: usize,
) -> (Vec<Notification>, usize) {
    let mut merged = existing;
    let mut index: HashMap<NotificationId, usize> = merged
        .iter()
        .enumerate()
        .map(|(pos, n)| (n.id.clone(), pos))
        .collect();

    for candidate in incoming {
        match index.get(&candidate.id) {
            Some(&pos) => {
                let read = merged[pos].read || candidate.read;
                merged[pos] = candidate;
                merged[pos].read = read;
            }
            None => {
                index.insert(candidate.id.clone(), merged.len());
                merged.push(candidate);
            }
        }
    }

    // Equal timestamps order by id.
    merged.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
    merged.truncate(capacity);

    let unread = merged.iter().filter(|n| n.is_unread()).count();
    (merged, unread)
}

/// Outcome of marking one notification read.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedRead {
    /// The entry after marking.
    pub notification: Notification,
    /// Whether it was unread before.
    pub was_unread: bool,
}

/// Owned, in-memory notification feed for one viewer.
#[derive(Debug, Clone)]
pub struct NotificationReconciler {
    items: Vec<Notification>,
    unread: usize,
    capacity: usize,
}

impl NotificationReconciler {
    /// Create an empty feed holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            unread: 0,
            capacity,
        }
    }

    /// Merge one emission's candidates. Returns the new unread count.
    pub fn merge(&mut self, batch: Vec<Notification>) -> usize {
        let incoming = batch.len();
        let existing = std::mem::take(&mut self.items);
        let (items, unread) = merge(existing, batch, self.capacity);
        self.items = items;
        self.unread = unread;
        debug!(
            incoming,
            total = self.items.len(),
            unread,
            "Merged notification batch"
        );
        unread
    }

    /// Mark one entry read. `None` if the id is not in the feed.
    pub fn mark_read(&mut self, id: &NotificationId) -> Option<MarkedRead> {
        let entry = self.items.iter_mut().find(|n| &n.id == id)?;
        let was_unread = entry.is_unread();
        entry.read = true;
        if was_unread {
            self.unread = self.unread.saturating_sub(1);
        }
        Some(MarkedRead {
            notification: entry.clone(),
            was_unread,
        })
    }

    /// Mark every entry read. Returns the entries that were unread.
    pub fn mark_all_read(&mut self) -> Vec<Notification> {
        let mut changed = Vec::with_capacity(self.unread);
        for entry in self.items.iter_mut().filter(|n| n.is_unread()) {
            entry.read = true;
            changed.push(entry.clone());
        }
        self.unread = 0;
        changed
    }

    /// Current entries, newest first.
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// Number of unread entries.
    pub fn unread_count(&self) -> usize {
        self.unread
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the feed is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.items.clear();
        self.unread = 0;
    }
}

impl Default for NotificationReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

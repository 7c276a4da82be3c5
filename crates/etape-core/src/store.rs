//! The step sequence store: single source of truth for the ordered list.
//!
//! The list lives inside a `watch` channel, so every consumer sees a
//! consistent snapshot and dependent views are notified on change. Updates
//! are whole-list replacements, never merges; a fresher fetch simply
//! replaces what is there, which sidesteps order-conflict ambiguity.

use tokio::sync::watch;

use crate::model::ItineraryStep;

/// Cheaply clonable handle to the shared step sequence.
#[derive(Debug, Clone)]
pub struct SequenceStore {
    tx: std::sync::Arc<watch::Sender<Vec<ItineraryStep>>>,
}

/// An immutable copy of the sequence at a point in time, used by the
/// reorder transaction's revert path. Restoring is only possible through
/// [`SequenceStore::restore`], which keeps the rollback boundary explicit.
#[derive(Debug, Clone)]
pub struct SequenceSnapshot(Vec<ItineraryStep>);

impl SequenceSnapshot {
    /// The steps captured in this snapshot.
    pub fn steps(&self) -> &[ItineraryStep] {
        &self.0
    }
}

impl SequenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_steps(Vec::new())
    }

    /// Create a store seeded with an initial list.
    pub fn with_steps(steps: Vec<ItineraryStep>) -> Self {
        let (tx, _rx) = watch::channel(steps);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    /// Replace the whole list and notify subscribers.
    pub fn replace(&self, steps: Vec<ItineraryStep>) {
        self.tx.send_replace(steps);
    }

    /// Clone of the current list.
    pub fn current(&self) -> Vec<ItineraryStep> {
        self.tx.borrow().clone()
    }

    /// Number of steps currently held.
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// True when every step carries a persisted id.
    pub fn is_fully_persisted(&self) -> bool {
        self.tx.borrow().iter().all(|step| step.id.is_some())
    }

    /// Capture the current list for a later [`restore`](Self::restore).
    pub fn snapshot(&self) -> SequenceSnapshot {
        SequenceSnapshot(self.current())
    }

    /// Revert to a previously captured snapshot, notifying subscribers.
    pub fn restore(&self, snapshot: SequenceSnapshot) {
        self.replace(snapshot.0);
    }

    /// Subscribe to list changes. The receiver borrows full snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ItineraryStep>> {
        self.tx.subscribe()
    }
}

impl Default for SequenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{draft_step, step};

    #[test]
    fn replace_is_a_full_replacement() {
        let store = SequenceStore::with_steps(vec![step(1, "2025-01-01", 1, 1)]);
        store.replace(vec![step(2, "2025-02-01", 2, 1), step(3, "2025-02-02", 2, 2)]);

        let current = store.current();
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].id, Some(2));
    }

    #[test]
    fn snapshot_then_restore_roundtrips() {
        let original = vec![step(1, "2025-01-01", 1, 1), step(2, "2025-01-02", 2, 2)];
        let store = SequenceStore::with_steps(original.clone());

        let snapshot = store.snapshot();
        store.replace(vec![step(9, "2025-03-01", 9, 1)]);
        store.restore(snapshot);

        assert_eq!(store.current(), original);
    }

    #[test]
    fn fully_persisted_check() {
        let store = SequenceStore::with_steps(vec![step(1, "2025-01-01", 1, 1)]);
        assert!(store.is_fully_persisted());

        store.replace(vec![
            step(1, "2025-01-01", 1, 1),
            draft_step("2025-01-02", 1, 2),
        ]);
        assert!(!store.is_fully_persisted());
    }

    #[tokio::test]
    async fn subscribers_are_notified_on_replace() {
        let store = SequenceStore::new();
        let mut rx = store.subscribe();

        store.replace(vec![step(1, "2025-01-01", 1, 1)]);
        rx.changed().await.expect("store should notify");
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}

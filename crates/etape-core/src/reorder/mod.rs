//! The reorder coordinator: turns a "move this step there" intent into a
//! renumbered sequence, applied optimistically and persisted in one bulk
//! call, with rollback to the pre-reorder snapshot on failure.
//!
//! Exactly one reorder may be in flight at a time; a second intent is
//! rejected rather than queued, and the last completed write wins.

mod pg;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ItineraryStep, StepKey};
use crate::store::SequenceStore;

pub use pg::PgOrderPersistence;

/// One `{id, order}` pair of the bulk persistence payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: i64,
    pub order: i32,
}

/// Failure of the bulk persistence call, with a message fit for the user.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PersistError {
    pub message: String,
}

impl PersistError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Persistence seam for the coordinator.
///
/// The whole renumbered list is carried in a single call so the backend
/// can apply it atomically; partial application is never requested.
#[async_trait]
pub trait OrderPersistence: Send + Sync {
    async fn persist_order(&self, entries: &[OrderEntry]) -> Result<(), PersistError>;
}

/// Why a reorder did not complete.
#[derive(Debug, Error)]
pub enum ReorderError {
    /// Some step in the sequence has no persisted id yet; nothing was
    /// mutated.
    #[error("cannot reorder while unsaved steps exist in the itinerary")]
    NotSynchronized,

    /// Another reorder is still being saved; this intent is dropped.
    #[error("a reorder is already being saved")]
    SaveInProgress,

    /// The bulk persistence call failed; the sequence was rolled back.
    #[error("failed to save the new order: {message}")]
    Persistence { message: String },
}

/// Result of a completed reorder call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The sequence was renumbered and persisted.
    Applied,
    /// Source and target were equal, or one of them was not found.
    Noop,
}

/// Move the element at `from` to index `to`, then renumber every position
/// to its 1-based index.
///
/// Indices refer to the list before the move (array move, not a swap).
/// Full renumbering is the policy: it is the simplest way to guarantee the
/// contiguous 1..N invariant and rules out order-gap bugs from partial
/// updates.
pub fn move_and_renumber(steps: &mut Vec<ItineraryStep>, from: usize, to: usize) {
    let moved = steps.remove(from);
    steps.insert(to.min(steps.len()), moved);
    for (index, step) in steps.iter_mut().enumerate() {
        step.position = (index + 1) as i32;
    }
}

/// Coordinates drag-intent reordering against the sequence store.
pub struct ReorderCoordinator {
    store: SequenceStore,
    backend: Arc<dyn OrderPersistence>,
    saving: AtomicBool,
}

/// Clears the saving flag on every exit path.
struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReorderCoordinator {
    pub fn new(store: SequenceStore, backend: Arc<dyn OrderPersistence>) -> Self {
        Self {
            store,
            backend,
            saving: AtomicBool::new(false),
        }
    }

    /// True while a save is in flight. The UI uses this to refuse starting
    /// a new drag.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Move the step identified by `source` to the slot of `target`,
    /// renumber, apply optimistically, and persist.
    pub async fn reorder(
        &self,
        source: &StepKey,
        target: &StepKey,
    ) -> Result<ReorderOutcome, ReorderError> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ReorderError::SaveInProgress);
        }
        let _guard = SavingGuard(&self.saving);

        let snapshot = self.store.snapshot();
        let mut steps = snapshot.steps().to_vec();

        // Reorder is only meaningful once the whole sequence is persisted;
        // a provisional step has no id to carry in the bulk payload.
        if steps.iter().any(|step| step.id.is_none()) {
            return Err(ReorderError::NotSynchronized);
        }

        let source_index = steps.iter().position(|step| step.key() == *source);
        let target_index = steps.iter().position(|step| step.key() == *target);
        let (from, to) = match (source_index, target_index) {
            (Some(from), Some(to)) if from != to => (from, to),
            _ => return Ok(ReorderOutcome::Noop),
        };

        move_and_renumber(&mut steps, from, to);

        let entries = steps
            .iter()
            .map(|step| {
                step.id
                    .map(|id| OrderEntry {
                        id,
                        order: step.position,
                    })
                    .ok_or(ReorderError::NotSynchronized)
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Optimistic apply: readers see the new order before the network
        // round-trip completes.
        self.store.replace(steps);

        match self.backend.persist_order(&entries).await {
            Ok(()) => {
                tracing::info!(?source, ?target, steps = entries.len(), "reorder persisted");
                Ok(ReorderOutcome::Applied)
            }
            Err(err) => {
                tracing::warn!(?source, ?target, error = %err, "reorder failed, rolling back");
                self.store.restore(snapshot);
                Err(ReorderError::Persistence {
                    message: err.message,
                })
            }
        }
    }
}

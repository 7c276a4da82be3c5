//! Current-step resolution: the most recent step that has already started.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::model::ItineraryStep;
use crate::store::SequenceStore;

/// Source of "now" at date granularity.
///
/// A seam so the resolver can be driven by a fake clock in tests and
/// refreshed without reloading anything in production.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation over the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Resolve the current step: the latest step (in position order) whose date
/// is on or before `today`.
///
/// Dates are day-granular already, so "normalize to midnight" is simply a
/// date comparison. Returns `None` when the whole itinerary lies in the
/// future or the list is empty.
pub fn current_step(steps: &[ItineraryStep], today: NaiveDate) -> Option<&ItineraryStep> {
    steps.iter().rev().find(|step| step.date <= today)
}

/// Background re-resolution of the current step.
///
/// Polls at a coarse interval (the midnight rollover does not need to be
/// caught to the second) and also recomputes whenever the store changes.
/// Subscribers are only woken when the resolved step actually changes.
pub struct CurrentStepWatcher {
    rx: watch::Receiver<Option<ItineraryStep>>,
}

impl CurrentStepWatcher {
    /// Spawn the watcher task. It exits when every receiver is dropped.
    pub fn spawn(store: SequenceStore, clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        let initial = current_step(&store.current(), clock.today()).cloned();
        let (tx, rx) = watch::channel(initial);

        let mut store_rx = store.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick fires immediately; harmless, it recomputes the
            // initial value.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = store_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tx.closed() => break,
                }

                let steps = store.current();
                let resolved = current_step(&steps, clock.today()).cloned();
                let notified = tx.send_if_modified(|previous| {
                    let previous_key = previous.as_ref().map(ItineraryStep::key);
                    let resolved_key = resolved.as_ref().map(ItineraryStep::key);
                    if previous_key == resolved_key {
                        false
                    } else {
                        *previous = resolved.clone();
                        true
                    }
                });
                if notified {
                    tracing::debug!(
                        step_id = ?resolved.as_ref().and_then(|s| s.id),
                        "current step changed"
                    );
                }
            }
        });

        Self { rx }
    }

    /// The last resolved value.
    pub fn current(&self) -> Option<ItineraryStep> {
        self.rx.borrow().clone()
    }

    /// Subscribe to current-step changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<ItineraryStep>> {
        self.rx.clone()
    }
}

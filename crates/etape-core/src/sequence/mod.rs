//! Pure derivations over the ordered step list: consecutive-destination
//! grouping, calendar-month bucketing, and current-step resolution.
//!
//! Everything here is a deterministic function of its input; the views
//! recompute from the store's current state and hold no state of their own.

mod current;
mod group;
mod month;

pub use current::{Clock, CurrentStepWatcher, SystemClock, current_step};
pub use group::group_steps;
pub use month::{MonthKey, bucket_by_month};

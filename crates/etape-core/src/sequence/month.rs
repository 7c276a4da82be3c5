//! Calendar-month bucketing for progressive disclosure of a long itinerary.
//!
//! The canonical bucket key is the numeric `(year, month)` pair, which
//! sorts correctly regardless of locale; the French label is derived from
//! it for display only and never used as a key.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::model::{ItineraryStep, StepGroup};

use super::group_steps;

/// Locale-independent year+month key. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthKey {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

const FRENCH_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Presentational French label, e.g. "janvier 2025".
    ///
    /// The fields are public, so out-of-range months (0, 13) must degrade
    /// instead of panicking.
    pub fn label_fr(&self) -> String {
        let name = self
            .month
            .checked_sub(1)
            .and_then(|index| FRENCH_MONTHS.get(index as usize))
            .copied()
            .unwrap_or("?");
        format!("{name} {}", self.year)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Bucket steps by calendar month, grouping each bucket's slice.
///
/// Buckets are emitted in chronological order. Each bucket is re-sorted by
/// position before grouping so the aggregation always runs on a locally
/// ordered slice.
pub fn bucket_by_month(steps: &[ItineraryStep]) -> Vec<(MonthKey, Vec<StepGroup>)> {
    let mut buckets: BTreeMap<MonthKey, Vec<ItineraryStep>> = BTreeMap::new();
    for step in steps {
        buckets
            .entry(MonthKey::from_date(step.date))
            .or_default()
            .push(step.clone());
    }

    buckets
        .into_iter()
        .map(|(key, mut slice)| {
            slice.sort_by_key(|s| s.position);
            let groups = group_steps(&slice);
            (key, groups)
        })
        .collect()
}

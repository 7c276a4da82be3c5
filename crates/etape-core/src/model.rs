//! Domain types for the sequencing module: the hydrated itinerary step and
//! the derived display groups.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use etape_db::models::{Activity, RouteDifficulty, StepWithDestination, TransportMode};

/// The destination a step is bound to, as carried inside the step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRef {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub category: Option<String>,
}

/// Transport descriptor from a step to the following one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub mode: TransportMode,
    pub duration_min: Option<i32>,
    pub distance_km: Option<f64>,
}

/// Structured detail for a cycling leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeSegment {
    pub distance_km: Option<f64>,
    pub difficulty: Option<RouteDifficulty>,
    pub waypoints: Option<serde_json::Value>,
}

/// One day (or leg) of the itinerary, hydrated with its destination and
/// activities.
///
/// `id` is `None` while a draft step has not been persisted yet; the
/// reorder coordinator refuses to run until every step carries an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryStep {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub destination: DestinationRef,
    pub position: i32,
    pub notes: Option<String>,
    pub activities: Vec<Activity>,
    pub transport_to_next: Option<Transport>,
    pub bike_segment: Option<BikeSegment>,
}

impl ItineraryStep {
    /// Stable key for locating this step in the sequence: the persisted id
    /// when present, otherwise the date+position composite.
    pub fn key(&self) -> StepKey {
        match self.id {
            Some(id) => StepKey::Id(id),
            None => StepKey::Provisional {
                date: self.date,
                position: self.position,
            },
        }
    }
}

/// Key identifying a step within the in-memory sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKey {
    /// Persisted step, identified by its database id.
    Id(i64),
    /// Draft step not yet persisted.
    Provisional { date: NaiveDate, position: i32 },
}

impl From<StepWithDestination> for ItineraryStep {
    fn from(row: StepWithDestination) -> Self {
        let transport_to_next = row.transport_mode.map(|mode| Transport {
            mode,
            duration_min: row.transport_duration_min,
            distance_km: row.transport_distance_km,
        });

        let has_bike_detail = row.bike_distance_km.is_some()
            || row.bike_difficulty.is_some()
            || row.bike_waypoints.is_some();
        let bike_segment = has_bike_detail.then(|| BikeSegment {
            distance_km: row.bike_distance_km,
            difficulty: row.bike_difficulty,
            waypoints: row.bike_waypoints,
        });

        Self {
            id: Some(row.id),
            date: row.date,
            destination: DestinationRef {
                id: row.destination_id,
                name: row.destination_name,
                latitude: row.latitude,
                longitude: row.longitude,
                address: row.address,
                category: row.destination_category,
            },
            position: row.position,
            notes: row.notes,
            activities: Vec::new(),
            transport_to_next,
            bike_segment,
        }
    }
}

/// Build hydrated steps from joined rows and their activities.
///
/// Rows are expected in position order; the relative order is preserved.
pub fn hydrate_itinerary(
    rows: Vec<StepWithDestination>,
    activities: Vec<Activity>,
) -> Vec<ItineraryStep> {
    let mut by_step: HashMap<i64, Vec<Activity>> = HashMap::new();
    for activity in activities {
        by_step.entry(activity.step_id).or_default().push(activity);
    }

    rows.into_iter()
        .map(|row| {
            let step_id = row.id;
            let mut step = ItineraryStep::from(row);
            if let Some(mut list) = by_step.remove(&step_id) {
                list.sort_by_key(|a| a.position);
                step.activities = list;
            }
            step
        })
        .collect()
}

/// Drop steps whose destination is not in the known set.
///
/// A dangling destination reference degrades to the step being skipped
/// from the views, never to a failed render.
pub fn filter_known_destinations(
    steps: Vec<ItineraryStep>,
    known: &HashSet<i64>,
) -> Vec<ItineraryStep> {
    steps
        .into_iter()
        .filter(|step| {
            let keep = known.contains(&step.destination.id);
            if !keep {
                tracing::warn!(
                    step_id = ?step.id,
                    destination_id = step.destination.id,
                    "skipping step with unknown destination"
                );
            }
            keep
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Display groups
// ---------------------------------------------------------------------------

/// A display-only aggregation of one or more consecutive steps at the same
/// destination. Never persisted; always recomputed from the ordered list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepGroup {
    /// Exactly one step.
    Single(ItineraryStep),
    /// A maximal run of two or more steps sharing a destination, with
    /// strictly consecutive positions.
    Range { steps: Vec<ItineraryStep> },
}

impl StepGroup {
    /// The member steps, in sequence order.
    pub fn steps(&self) -> &[ItineraryStep] {
        match self {
            Self::Single(step) => std::slice::from_ref(step),
            Self::Range { steps } => steps,
        }
    }

    /// Number of member steps (at least 1).
    pub fn len(&self) -> usize {
        self.steps().len()
    }

    /// A group always has at least one member.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Shared destination of the group.
    pub fn destination(&self) -> &DestinationRef {
        // Both variants hold at least one step.
        &self.steps()[0].destination
    }

    /// Date of the first member.
    pub fn start_date(&self) -> NaiveDate {
        self.steps()[0].date
    }

    /// Date of the last member.
    pub fn end_date(&self) -> NaiveDate {
        self.steps()[self.len() - 1].date
    }
}

//! Itinerary loading: fetch joined rows and activities, hydrate domain
//! steps, and defensively drop steps whose destination is unknown.

use std::collections::HashSet;

use anyhow::Result;
use sqlx::PgPool;

use etape_db::queries::{activities, destinations, steps};

use crate::model::{ItineraryStep, filter_known_destinations, hydrate_itinerary};

/// Load the full itinerary in position order.
///
/// The fresh list is intended for
/// [`SequenceStore::replace`](crate::store::SequenceStore::replace):
/// fetches replace, they never merge.
pub async fn load_itinerary(pool: &PgPool) -> Result<Vec<ItineraryStep>> {
    let rows = steps::list_steps_with_destination(pool).await?;
    let all_activities = activities::list_all_activities(pool).await?;
    let known: HashSet<i64> = destinations::list_destination_ids(pool)
        .await?
        .into_iter()
        .collect();

    let hydrated = hydrate_itinerary(rows, all_activities);
    Ok(filter_known_destinations(hydrated, &known))
}

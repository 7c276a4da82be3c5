//! Database query functions for the `steps` table, including the
//! transactional bulk position update used by the reorder path.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{RouteDifficulty, Step, StepWithDestination, TransportMode};

/// Columns selected for the joined itinerary view.
const STEP_WITH_DESTINATION_COLUMNS: &str = "s.id, s.destination_id, s.date, s.position, \
     s.notes, s.transport_mode, s.transport_duration_min, s.transport_distance_km, \
     s.bike_distance_km, s.bike_difficulty, s.bike_waypoints, s.created_at, \
     d.name AS destination_name, d.latitude, d.longitude, d.address, \
     d.category AS destination_category";

/// Insert a new step, appended at the end of the sequence.
///
/// The position is assigned server-side as `MAX(position) + 1` (1 for an
/// empty itinerary), so concurrent inserts cannot race on a client-computed
/// value.
pub async fn insert_step(
    pool: &PgPool,
    destination_id: i64,
    date: NaiveDate,
    notes: Option<&str>,
) -> Result<Step> {
    let step = sqlx::query_as::<_, Step>(
        "INSERT INTO steps (destination_id, date, position, notes) \
         SELECT $1::bigint, $2::date, COALESCE(MAX(position), 0) + 1, $3::text FROM steps \
         RETURNING *",
    )
    .bind(destination_id)
    .bind(date)
    .bind(notes)
    .fetch_one(pool)
    .await
    .context("failed to insert step")?;

    Ok(step)
}

/// Fetch a single step by ID.
pub async fn get_step(pool: &PgPool, id: i64) -> Result<Option<Step>> {
    let step = sqlx::query_as::<_, Step>("SELECT * FROM steps WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch step")?;

    Ok(step)
}

/// List all steps joined with their destination, ordered by position.
pub async fn list_steps_with_destination(pool: &PgPool) -> Result<Vec<StepWithDestination>> {
    let query = format!(
        "SELECT {STEP_WITH_DESTINATION_COLUMNS} \
         FROM steps s \
         JOIN destinations d ON d.id = s.destination_id \
         ORDER BY s.position ASC"
    );
    let steps = sqlx::query_as::<_, StepWithDestination>(&query)
        .fetch_all(pool)
        .await
        .context("failed to list steps")?;

    Ok(steps)
}

/// Fetch a single step joined with its destination.
pub async fn get_step_with_destination(
    pool: &PgPool,
    id: i64,
) -> Result<Option<StepWithDestination>> {
    let query = format!(
        "SELECT {STEP_WITH_DESTINATION_COLUMNS} \
         FROM steps s \
         JOIN destinations d ON d.id = s.destination_id \
         WHERE s.id = $1"
    );
    let step = sqlx::query_as::<_, StepWithDestination>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch step")?;

    Ok(step)
}

/// Patch a step's editable scalar fields. Fields passed as `None` keep
/// their current value (COALESCE); this is the single-field edit path and
/// deliberately never touches `position`.
pub async fn patch_step(
    pool: &PgPool,
    id: i64,
    date: Option<NaiveDate>,
    destination_id: Option<i64>,
    notes: Option<&str>,
) -> Result<Step> {
    let step = sqlx::query_as::<_, Step>(
        "UPDATE steps \
         SET date = COALESCE($1, date), \
             destination_id = COALESCE($2, destination_id), \
             notes = COALESCE($3, notes) \
         WHERE id = $4 \
         RETURNING *",
    )
    .bind(date)
    .bind(destination_id)
    .bind(notes)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to patch step")?;

    step.with_context(|| format!("step {id} not found"))
}

/// Set (or clear) the transport-to-next descriptor of a step.
pub async fn set_transport(
    pool: &PgPool,
    id: i64,
    mode: Option<TransportMode>,
    duration_min: Option<i32>,
    distance_km: Option<f64>,
) -> Result<Step> {
    let step = sqlx::query_as::<_, Step>(
        "UPDATE steps \
         SET transport_mode = $1, \
             transport_duration_min = $2, \
             transport_distance_km = $3 \
         WHERE id = $4 \
         RETURNING *",
    )
    .bind(mode)
    .bind(duration_min)
    .bind(distance_km)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to set step transport")?;

    step.with_context(|| format!("step {id} not found"))
}

/// Set (or clear) the bike-segment detail of a step.
pub async fn set_bike_segment(
    pool: &PgPool,
    id: i64,
    distance_km: Option<f64>,
    difficulty: Option<RouteDifficulty>,
    waypoints: Option<serde_json::Value>,
) -> Result<Step> {
    let step = sqlx::query_as::<_, Step>(
        "UPDATE steps \
         SET bike_distance_km = $1, \
             bike_difficulty = $2, \
             bike_waypoints = $3 \
         WHERE id = $4 \
         RETURNING *",
    )
    .bind(distance_km)
    .bind(difficulty)
    .bind(waypoints)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to set step bike segment")?;

    step.with_context(|| format!("step {id} not found"))
}

/// Delete a step.
///
/// Positions of the remaining steps are left untouched: gaps in the
/// sequence are allowed, only the reorder path renumbers to 1..N.
pub async fn delete_step(pool: &PgPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM steps WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete step")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("step {id} not found");
    }

    Ok(())
}

/// Apply a bulk `(id, position)` assignment inside a single transaction.
///
/// Any entry whose id does not match an existing step aborts the whole
/// operation, so a failed bulk write leaves the table exactly as it was.
pub async fn apply_order(pool: &PgPool, entries: &[(i64, i32)]) -> Result<()> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    for (id, position) in entries {
        let result = sqlx::query("UPDATE steps SET position = $1 WHERE id = $2")
            .bind(position)
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to update position of step {id}"))?;

        if result.rows_affected() == 0 {
            anyhow::bail!("step {id} not found");
        }
    }

    tx.commit().await.context("failed to commit reorder")?;
    Ok(())
}

/// Count all steps.
pub async fn count_steps(pool: &PgPool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM steps")
        .fetch_one(pool)
        .await
        .context("failed to count steps")?;

    Ok(row.0)
}

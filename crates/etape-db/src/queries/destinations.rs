//! Database query functions for the `destinations` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::Destination;

/// Insert a new destination row. Returns the inserted destination with
/// server-generated defaults (id, created_at).
pub async fn insert_destination(
    pool: &PgPool,
    name: &str,
    latitude: f64,
    longitude: f64,
    address: Option<&str>,
    category: Option<&str>,
    description: Option<&str>,
) -> Result<Destination> {
    let destination = sqlx::query_as::<_, Destination>(
        "INSERT INTO destinations (name, latitude, longitude, address, category, description) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(name)
    .bind(latitude)
    .bind(longitude)
    .bind(address)
    .bind(category)
    .bind(description)
    .fetch_one(pool)
    .await
    .context("failed to insert destination")?;

    Ok(destination)
}

/// Fetch a single destination by ID.
pub async fn get_destination(pool: &PgPool, id: i64) -> Result<Option<Destination>> {
    let destination = sqlx::query_as::<_, Destination>("SELECT * FROM destinations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch destination")?;

    Ok(destination)
}

/// List all destinations, ordered by name.
pub async fn list_destinations(pool: &PgPool) -> Result<Vec<Destination>> {
    let destinations =
        sqlx::query_as::<_, Destination>("SELECT * FROM destinations ORDER BY name ASC")
            .fetch_all(pool)
            .await
            .context("failed to list destinations")?;

    Ok(destinations)
}

/// List the IDs of all known destinations.
///
/// Used for defensive filtering: steps referencing an unknown destination
/// are skipped from the itinerary views instead of breaking them.
pub async fn list_destination_ids(pool: &PgPool) -> Result<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM destinations")
        .fetch_all(pool)
        .await
        .context("failed to list destination ids")?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Count the steps currently referencing a destination.
pub async fn count_referencing_steps(pool: &PgPool, id: i64) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM steps WHERE destination_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .context("failed to count referencing steps")?;

    Ok(row.0)
}

/// Delete a destination.
///
/// Fails when any step still references it (the caller should check with
/// [`count_referencing_steps`] first for a friendlier message; the FK
/// constraint backs this up either way).
pub async fn delete_destination(pool: &PgPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM destinations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete destination")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("destination {id} not found");
    }

    Ok(())
}

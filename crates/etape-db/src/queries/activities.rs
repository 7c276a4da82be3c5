//! Database query functions for the `activities` table.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use sqlx::PgPool;

use crate::models::{Activity, ActivityCategory};

/// Insert an activity, appended at the end of its step's activity list.
pub async fn insert_activity(
    pool: &PgPool,
    step_id: i64,
    name: &str,
    category: Option<ActivityCategory>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> Result<Activity> {
    let activity = sqlx::query_as::<_, Activity>(
        "INSERT INTO activities (step_id, name, category, start_time, end_time, position) \
         SELECT $1::bigint, $2::text, $3::text, $4::time, $5::time, \
                COALESCE(MAX(position), 0) + 1 \
         FROM activities WHERE step_id = $1 \
         RETURNING *",
    )
    .bind(step_id)
    .bind(name)
    .bind(category)
    .bind(start_time)
    .bind(end_time)
    .fetch_one(pool)
    .await
    .context("failed to insert activity")?;

    Ok(activity)
}

/// List the activities of a step, in position order.
pub async fn list_activities_for_step(pool: &PgPool, step_id: i64) -> Result<Vec<Activity>> {
    let activities = sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities WHERE step_id = $1 ORDER BY position ASC",
    )
    .bind(step_id)
    .fetch_all(pool)
    .await
    .context("failed to list activities")?;

    Ok(activities)
}

/// List the activities of every step, in (step_id, position) order.
pub async fn list_all_activities(pool: &PgPool) -> Result<Vec<Activity>> {
    let activities = sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities ORDER BY step_id ASC, position ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list activities")?;

    Ok(activities)
}

/// Delete an activity.
pub async fn delete_activity(pool: &PgPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM activities WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete activity")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("activity {id} not found");
    }

    Ok(())
}

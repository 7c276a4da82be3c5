//! Integration tests for destination, step, and activity CRUD.
//!
//! Each test creates a unique temporary database, runs migrations, and
//! drops it on completion so tests are fully isolated.

use chrono::NaiveDate;
use sqlx::PgPool;

use etape_db::models::{ActivityCategory, Destination, TransportMode};
use etape_db::queries::{activities, destinations, steps};
use etape_test_utils::{create_test_db, drop_test_db};

fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid date literal")
}

async fn seed_destination(pool: &PgPool, name: &str) -> Destination {
    etape_test_utils::seed_destination(pool, name, 45.76, 4.83).await
}

#[tokio::test]
async fn steps_are_appended_with_contiguous_positions() {
    let (pool, db_name) = create_test_db().await;
    let lyon = seed_destination(&pool, "Lyon").await;

    let first = steps::insert_step(&pool, lyon.id, date("2025-05-01"), None)
        .await
        .expect("insert should succeed");
    let second = steps::insert_step(&pool, lyon.id, date("2025-05-02"), Some("rest day"))
        .await
        .expect("insert should succeed");
    let third = steps::insert_step(&pool, lyon.id, date("2025-05-03"), None)
        .await
        .expect("insert should succeed");

    assert_eq!(first.position, 1);
    assert_eq!(second.position, 2);
    assert_eq!(third.position, 3);
    assert_eq!(second.notes.as_deref(), Some("rest day"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn joined_list_is_ordered_and_carries_destination_fields() {
    let (pool, db_name) = create_test_db().await;
    let lyon = seed_destination(&pool, "Lyon").await;
    let vienne = seed_destination(&pool, "Vienne").await;

    steps::insert_step(&pool, lyon.id, date("2025-05-01"), None)
        .await
        .expect("insert should succeed");
    steps::insert_step(&pool, vienne.id, date("2025-05-02"), None)
        .await
        .expect("insert should succeed");

    let listed = steps::list_steps_with_destination(&pool)
        .await
        .expect("list should succeed");

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].position, 1);
    assert_eq!(listed[0].destination_name, "Lyon");
    assert_eq!(listed[1].destination_name, "Vienne");
    assert!((listed[0].latitude - 45.76).abs() < 1e-9);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn patch_updates_only_provided_fields() {
    let (pool, db_name) = create_test_db().await;
    let lyon = seed_destination(&pool, "Lyon").await;

    let step = steps::insert_step(&pool, lyon.id, date("2025-05-01"), Some("original"))
        .await
        .expect("insert should succeed");

    let patched = steps::patch_step(&pool, step.id, Some(date("2025-05-04")), None, None)
        .await
        .expect("patch should succeed");

    assert_eq!(patched.date, date("2025-05-04"));
    assert_eq!(patched.notes.as_deref(), Some("original"));
    assert_eq!(patched.destination_id, lyon.id);
    assert_eq!(patched.position, step.position, "patch must never touch position");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn transport_and_bike_segment_are_settable() {
    let (pool, db_name) = create_test_db().await;
    let lyon = seed_destination(&pool, "Lyon").await;

    let step = steps::insert_step(&pool, lyon.id, date("2025-05-01"), None)
        .await
        .expect("insert should succeed");

    let updated = steps::set_transport(&pool, step.id, Some(TransportMode::Bike), Some(240), Some(62.5))
        .await
        .expect("set_transport should succeed");
    assert_eq!(updated.transport_mode, Some(TransportMode::Bike));
    assert_eq!(updated.transport_duration_min, Some(240));

    let cleared = steps::set_transport(&pool, step.id, None, None, None)
        .await
        .expect("clearing transport should succeed");
    assert_eq!(cleared.transport_mode, None);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_leaves_a_position_gap() {
    let (pool, db_name) = create_test_db().await;
    let lyon = seed_destination(&pool, "Lyon").await;

    let first = steps::insert_step(&pool, lyon.id, date("2025-05-01"), None)
        .await
        .expect("insert should succeed");
    let second = steps::insert_step(&pool, lyon.id, date("2025-05-02"), None)
        .await
        .expect("insert should succeed");
    let third = steps::insert_step(&pool, lyon.id, date("2025-05-03"), None)
        .await
        .expect("insert should succeed");

    steps::delete_step(&pool, second.id)
        .await
        .expect("delete should succeed");

    let listed = steps::list_steps_with_destination(&pool)
        .await
        .expect("list should succeed");
    let positions: Vec<i32> = listed.iter().map(|s| s.position).collect();
    assert_eq!(positions, [first.position, third.position]);
    assert_eq!(positions, [1, 3], "deletes never renumber");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn referenced_destination_cannot_be_deleted() {
    let (pool, db_name) = create_test_db().await;
    let lyon = seed_destination(&pool, "Lyon").await;

    steps::insert_step(&pool, lyon.id, date("2025-05-01"), None)
        .await
        .expect("insert should succeed");

    let count = destinations::count_referencing_steps(&pool, lyon.id)
        .await
        .expect("count should succeed");
    assert_eq!(count, 1);

    let result = destinations::delete_destination(&pool, lyon.id).await;
    assert!(result.is_err(), "FK constraint should block the delete");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn activities_are_ordered_and_cascade_with_their_step() {
    let (pool, db_name) = create_test_db().await;
    let lyon = seed_destination(&pool, "Lyon").await;

    let step = steps::insert_step(&pool, lyon.id, date("2025-05-01"), None)
        .await
        .expect("insert should succeed");

    activities::insert_activity(&pool, step.id, "old town walk", Some(ActivityCategory::Sightseeing), None, None)
        .await
        .expect("insert_activity should succeed");
    let lunch = activities::insert_activity(
        &pool,
        step.id,
        "bouchon lunch",
        Some(ActivityCategory::Food),
        Some("12:30:00".parse().expect("valid time")),
        Some("14:00:00".parse().expect("valid time")),
    )
    .await
    .expect("insert_activity should succeed");

    let listed = activities::list_activities_for_step(&pool, step.id)
        .await
        .expect("list should succeed");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].position, 1);
    assert_eq!(listed[1].position, 2);
    assert_eq!(lunch.position, 2);

    steps::delete_step(&pool, step.id)
        .await
        .expect("delete should succeed");
    let remaining = activities::list_all_activities(&pool)
        .await
        .expect("list should succeed");
    assert!(remaining.is_empty(), "activities cascade with their step");

    pool.close().await;
    drop_test_db(&db_name).await;
}

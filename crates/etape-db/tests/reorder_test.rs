//! Integration tests for the transactional bulk position update.

use sqlx::PgPool;

use etape_db::queries::steps;
use etape_test_utils::{create_test_db, drop_test_db, seed_itinerary};

async fn seed_three_steps(pool: &PgPool) -> Vec<i64> {
    let seeded = seed_itinerary(
        pool,
        &[
            ("Arles", "2025-06-01"),
            ("Arles", "2025-06-02"),
            ("Arles", "2025-06-03"),
        ],
    )
    .await;
    seeded.into_iter().map(|s| s.id).collect()
}

#[tokio::test]
async fn apply_order_renumbers_every_row() {
    let (pool, db_name) = create_test_db().await;
    let ids = seed_three_steps(&pool).await;

    // Move the last step to the front.
    steps::apply_order(&pool, &[(ids[2], 1), (ids[0], 2), (ids[1], 3)])
        .await
        .expect("apply_order should succeed");

    let listed = steps::list_steps_with_destination(&pool)
        .await
        .expect("list should succeed");
    let ordered_ids: Vec<i64> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ordered_ids, [ids[2], ids[0], ids[1]]);
    let positions: Vec<i32> = listed.iter().map(|s| s.position).collect();
    assert_eq!(positions, [1, 2, 3]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn apply_order_with_unknown_id_changes_nothing() {
    let (pool, db_name) = create_test_db().await;
    let ids = seed_three_steps(&pool).await;

    let result = steps::apply_order(&pool, &[(ids[2], 1), (999_999, 2), (ids[1], 3)]).await;
    assert!(result.is_err(), "unknown id should abort the bulk update");

    // The transaction rolled back: original positions intact.
    let listed = steps::list_steps_with_destination(&pool)
        .await
        .expect("list should succeed");
    let ordered_ids: Vec<i64> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ordered_ids, ids);
    let positions: Vec<i32> = listed.iter().map(|s| s.position).collect();
    assert_eq!(positions, [1, 2, 3]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

//! Migration smoke tests: the embedded migrations build the expected
//! schema and can be re-applied without effect.

use etape_db::pool::{self, TableCounts};
use etape_test_utils::{create_test_db, drop_test_db, seed_itinerary};

#[tokio::test]
async fn migrations_create_expected_tables() {
    let (pool, db_name) = create_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT tablename::text FROM pg_tables WHERE schemaname = 'public' ORDER BY tablename",
    )
    .fetch_all(&pool)
    .await
    .expect("should list tables");

    let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
    for expected in ["activities", "destinations", "steps"] {
        assert!(
            names.contains(&expected),
            "missing table {expected}, got: {names:?}"
        );
    }

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn table_counts_reports_per_table() {
    let (pool, db_name) = create_test_db().await;

    let empty = pool::table_counts(&pool).await.expect("counts should succeed");
    assert_eq!(
        empty,
        TableCounts {
            destinations: 0,
            steps: 0,
            activities: 0,
        }
    );

    seed_itinerary(&pool, &[("Nîmes", "2025-06-01"), ("Nîmes", "2025-06-02")]).await;

    let seeded = pool::table_counts(&pool).await.expect("counts should succeed");
    assert_eq!(seeded.destinations, 1);
    assert_eq!(seeded.steps, 2);
    assert_eq!(seeded.activities, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (pool, db_name) = create_test_db().await;

    // create_test_db already ran them once.
    pool::run_migrations(&pool)
        .await
        .expect("re-running migrations should be a no-op");

    pool.close().await;
    drop_test_db(&db_name).await;
}

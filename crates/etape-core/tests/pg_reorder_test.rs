//! End-to-end reorder through the PostgreSQL persistence backend: the
//! coordinator's optimistic apply lands in the store and the database, and
//! a database-level failure rolls the store back.

use std::sync::Arc;

use etape_core::model::{ItineraryStep, StepKey, hydrate_itinerary};
use etape_core::reorder::{PgOrderPersistence, ReorderCoordinator, ReorderError, ReorderOutcome};
use etape_core::store::SequenceStore;
use etape_db::queries::steps;
use etape_test_utils::{create_test_db, drop_test_db, seed_itinerary};

async fn seed_hydrated_itinerary(pool: &sqlx::PgPool) -> Vec<ItineraryStep> {
    seed_itinerary(
        pool,
        &[
            ("Avignon", "2025-07-01"),
            ("Avignon", "2025-07-02"),
            ("Orange", "2025-07-03"),
        ],
    )
    .await;

    let rows = steps::list_steps_with_destination(pool)
        .await
        .expect("list should succeed");
    hydrate_itinerary(rows, Vec::new())
}

#[tokio::test]
async fn reorder_persists_through_postgres() {
    let (pool, db_name) = create_test_db().await;

    let itinerary = seed_hydrated_itinerary(&pool).await;
    let ids: Vec<i64> = itinerary.iter().filter_map(|s| s.id).collect();

    let store = SequenceStore::with_steps(itinerary);
    let backend = Arc::new(PgOrderPersistence::new(pool.clone()));
    let coordinator = ReorderCoordinator::new(store.clone(), backend);

    let outcome = coordinator
        .reorder(&StepKey::Id(ids[2]), &StepKey::Id(ids[0]))
        .await
        .expect("reorder should succeed");
    assert_eq!(outcome, ReorderOutcome::Applied);

    // Store and database agree on the new order.
    let in_store: Vec<i64> = store.current().iter().filter_map(|s| s.id).collect();
    assert_eq!(in_store, [ids[2], ids[0], ids[1]]);

    let rows = steps::list_steps_with_destination(&pool)
        .await
        .expect("list should succeed");
    let in_db: Vec<i64> = rows.iter().map(|s| s.id).collect();
    assert_eq!(in_db, in_store);
    let positions: Vec<i32> = rows.iter().map(|s| s.position).collect();
    assert_eq!(positions, [1, 2, 3]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn database_failure_rolls_the_store_back() {
    let (pool, db_name) = create_test_db().await;

    let mut itinerary = seed_hydrated_itinerary(&pool).await;
    // Sabotage one entry: an id the database does not know forces the
    // transactional bulk update to abort.
    itinerary[1].id = Some(999_999);
    let original = itinerary.clone();

    let store = SequenceStore::with_steps(itinerary);
    let backend = Arc::new(PgOrderPersistence::new(pool.clone()));
    let coordinator = ReorderCoordinator::new(store.clone(), backend);

    let source = original[2].key();
    let target = original[0].key();
    let err = coordinator
        .reorder(&source, &target)
        .await
        .expect_err("reorder should fail");
    assert!(matches!(err, ReorderError::Persistence { .. }));

    assert_eq!(store.current(), original, "store must match the pre-reorder snapshot");

    pool.close().await;
    drop_test_db(&db_name).await;
}

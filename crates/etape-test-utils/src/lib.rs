//! Shared test utilities for étape integration tests: one PostgreSQL
//! server per test binary, one throwaway database per test, and seeding
//! helpers for building small itineraries.
//!
//! Server modes:
//! - **`ETAPE_TEST_PG_URL`** set (nextest setup script): use the external
//!   container directly. No testcontainers overhead per process.
//! - **No env var** (`cargo test`): spin up a container via testcontainers,
//!   shared per binary through a `OnceCell`.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use etape_db::models::{Destination, Step};
use etape_db::queries::{destinations, steps};
use etape_db::pool;

struct PgServer {
    base_url: String,
    /// Held to keep the container alive. `None` when using an external URL.
    _container: Option<ContainerAsync<Postgres>>,
}

static PG_SERVER: OnceCell<PgServer> = OnceCell::const_new();

async fn start_pg_server() -> PgServer {
    if let Ok(url) = std::env::var("ETAPE_TEST_PG_URL") {
        return PgServer {
            base_url: url,
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("18")
        .start()
        .await
        .expect("failed to start PostgreSQL container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    PgServer {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Base URL of the shared PostgreSQL server (no database name appended).
///
/// Lazily starts a container on first call unless `ETAPE_TEST_PG_URL` is
/// set.
pub async fn pg_url() -> &'static str {
    let server = PG_SERVER.get_or_init(start_pg_server).await;
    &server.base_url
}

/// One connection to the server's `postgres` database, for CREATE/DROP
/// DATABASE statements.
async fn admin_connection(base_url: &str) -> PgConnection {
    PgConnection::connect(&format!("{base_url}/postgres"))
        .await
        .expect("failed to connect to the postgres maintenance database")
}

/// Create a uniquely-named database with migrations applied.
///
/// Returns `(pool, db_name)`; pass `db_name` to [`drop_test_db`] when the
/// test is done.
pub async fn create_test_db() -> (PgPool, String) {
    let base_url = pg_url().await;
    let db_name = format!("etape_test_{}", Uuid::new_v4().simple());

    let mut admin = admin_connection(base_url).await;
    admin
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create test database {db_name}: {e}"));
    let _ = admin.close().await;

    let test_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&format!("{base_url}/{db_name}"))
        .await
        .unwrap_or_else(|e| panic!("failed to connect to test database {db_name}: {e}"));

    pool::run_migrations(&test_pool)
        .await
        .expect("migrations should succeed");

    (test_pool, db_name)
}

/// Drop a test database, terminating any connections still attached.
/// Safe to call when the database is already gone.
pub async fn drop_test_db(db_name: &str) {
    let base_url = pg_url().await;
    let mut admin = admin_connection(base_url).await;

    let terminate = format!(
        "SELECT pg_terminate_backend(pid) \
         FROM pg_stat_activity \
         WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
    );
    let _ = admin.execute(terminate.as_str()).await;
    let _ = admin
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    let _ = admin.close().await;
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

/// Insert a destination with placeholder coordinates.
pub async fn seed_destination(pool: &PgPool, name: &str, latitude: f64, longitude: f64) -> Destination {
    destinations::insert_destination(pool, name, latitude, longitude, None, None, None)
        .await
        .expect("insert_destination should succeed")
}

/// Append a step bound to an existing destination.
pub async fn seed_step(pool: &PgPool, destination_id: i64, date: &str) -> Step {
    let date: NaiveDate = date.parse().expect("valid date literal");
    steps::insert_step(pool, destination_id, date, None)
        .await
        .expect("insert_step should succeed")
}

/// Build an itinerary from `(destination name, date)` legs, appending the
/// steps in order. Legs sharing a name reuse one destination row, so
/// consecutive same-name legs form a groupable run.
pub async fn seed_itinerary(pool: &PgPool, legs: &[(&str, &str)]) -> Vec<Step> {
    let mut by_name: HashMap<String, i64> = HashMap::new();
    let mut seeded = Vec::with_capacity(legs.len());

    for (name, date) in legs {
        let destination_id = match by_name.get(*name) {
            Some(id) => *id,
            None => {
                let destination = seed_destination(pool, name, 45.0, 4.8).await;
                by_name.insert((*name).to_string(), destination.id);
                destination.id
            }
        };
        seeded.push(seed_step(pool, destination_id, date).await);
    }

    seeded
}

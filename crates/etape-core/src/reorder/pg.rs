//! PostgreSQL-backed order persistence.

use async_trait::async_trait;
use sqlx::PgPool;

use etape_db::queries::steps as step_queries;

use super::{OrderEntry, OrderPersistence, PersistError};

/// Persists the bulk order payload through the transactional
/// `steps::apply_order` query: either every position lands or none does.
#[derive(Debug, Clone)]
pub struct PgOrderPersistence {
    pool: PgPool,
}

impl PgOrderPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderPersistence for PgOrderPersistence {
    async fn persist_order(&self, entries: &[OrderEntry]) -> Result<(), PersistError> {
        let pairs: Vec<(i64, i32)> = entries.iter().map(|e| (e.id, e.order)).collect();
        step_queries::apply_order(&self.pool, &pairs)
            .await
            .map_err(|err| PersistError::new(format!("{err:#}")))
    }
}

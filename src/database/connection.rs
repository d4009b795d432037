//! Postgres pool whose queries all go through the database circuit breaker.

use crate::database::DatabaseCircuitBreaker;
use crate::resilience::CircuitBreakerError;
use sqlx::{PgPool, Row};
use std::future::Future;
use std::sync::Arc;

pub type GuardedResult<T> = Result<T, CircuitBreakerError<sqlx::Error>>;

#[derive(Debug, Clone)]
pub struct GuardedPool {
    pool: PgPool,
    breaker: Arc<DatabaseCircuitBreaker>,
}

impl GuardedPool {
    pub fn new(pool: PgPool, breaker: Arc<DatabaseCircuitBreaker>) -> Self {
        Self { pool, breaker }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn breaker(&self) -> &Arc<DatabaseCircuitBreaker> {
        &self.breaker
    }

    /// Run a query closure against the pool, guarded by the breaker
    pub async fn execute_guarded<F, Fut, T>(&self, query: F) -> GuardedResult<T>
    where
        F: FnOnce(PgPool) -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let pool = self.pool.clone();
        self.breaker.execute(move || query(pool)).await
    }

    pub async fn health_check(&self) -> GuardedResult<bool> {
        self.breaker
            .execute(|| async {
                let row = sqlx::query("SELECT 1 AS health")
                    .fetch_one(&self.pool)
                    .await?;
                let health: i32 = row.try_get("health")?;
                Ok::<_, sqlx::Error>(health == 1)
            })
            .await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

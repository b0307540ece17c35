use std::sync::Arc;
use std::time::Instant;

use domain::services::StoreHealth;
use sqlx::PgPool;

use super::scheduler::{Job, JobFrequency};

/// Pings the request store and samples pool gauges when Postgres backs it.
pub struct StoreProbeJob {
    health: Arc<dyn StoreHealth>,
    pool: Option<PgPool>,
}

impl StoreProbeJob {
    pub fn new(health: Arc<dyn StoreHealth>) -> Self {
        Self { health, pool: None }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

#[async_trait::async_trait]
impl Job for StoreProbeJob {
    fn name(&self) -> &'static str {
        "store_probe"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(10)
    }

    async fn execute(&self) -> Result<(), String> {
        if let Some(ref pool) = self.pool {
            persistence::metrics::record_pool_metrics(pool);
        }

        let started = Instant::now();
        let result = self.health.ping().await;
        metrics::histogram!("store_ping_duration_seconds").record(started.elapsed().as_secs_f64());
        metrics::gauge!("store_up").set(if result.is_ok() { 1.0 } else { 0.0 });

        result.map_err(|e| format!("store ping failed: {}", e))
    }
}

//! Repository implementations of the domain store ports.

pub mod ambulance_request;
pub mod availability;
pub mod help_request;

use std::sync::Arc;

use domain::services::{StoreHealth, StoreResult, Stores};
use sqlx::PgPool;

pub use ambulance_request::AmbulanceRequestRepository;
pub use availability::AvailabilityRepository;
pub use help_request::HelpRequestRepository;

use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Database liveness probe.
#[derive(Clone)]
pub struct PoolHealth {
    pool: PgPool,
}

impl PoolHealth {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl StoreHealth for PoolHealth {
    async fn ping(&self) -> StoreResult<()> {
        let timer = QueryTimer::new("ping");
        let result = sqlx::query("SELECT 1").execute(&self.pool).await;
        timer.finish(&result);
        result.map(|_| ()).map_err(store_error)
    }
}

/// Builds the store bundle backed by `pool`.
pub fn postgres_stores(pool: PgPool) -> Stores {
    Stores {
        availability: Arc::new(AvailabilityRepository::new(pool.clone())),
        help_requests: Arc::new(HelpRequestRepository::new(pool.clone())),
        ambulance_requests: Arc::new(AmbulanceRequestRepository::new(pool.clone())),
        health: Arc::new(PoolHealth::new(pool)),
    }
}

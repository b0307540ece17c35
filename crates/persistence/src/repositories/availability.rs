//! Ambulance availability repository.
//!
//! Every mutation is one statement with the delta applied in SQL, so
//! concurrent callers serialize on the row lock and never overwrite each
//! other's counts.

use domain::models::AmbulanceAvailability;
use domain::services::{AvailabilityStore, StoreError, StoreResult};
use sqlx::PgPool;

use crate::entities::AmbulanceAvailabilityEntity;
use crate::error::store_error;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct AvailabilityRepository {
    pool: PgPool,
}

impl AvailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl AvailabilityStore for AvailabilityRepository {
    async fn find(&self, hospital_id: &str) -> StoreResult<Option<AmbulanceAvailability>> {
        let timer = QueryTimer::new("find_availability");
        let result = sqlx::query_as::<_, AmbulanceAvailabilityEntity>(
            r#"
            SELECT hospital_id, available_count, total_count, created_at, updated_at
            FROM ambulance_availability
            WHERE hospital_id = $1
            "#,
        )
        .bind(hospital_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn insert_if_absent(
        &self,
        hospital_id: &str,
        fleet_size: i32,
    ) -> StoreResult<AmbulanceAvailability> {
        let timer = QueryTimer::new("insert_availability");
        let result = sqlx::query_as::<_, AmbulanceAvailabilityEntity>(
            r#"
            INSERT INTO ambulance_availability (hospital_id, available_count, total_count)
            VALUES ($1, $2, $2)
            ON CONFLICT (hospital_id) DO NOTHING
            RETURNING hospital_id, available_count, total_count, created_at, updated_at
            "#,
        )
        .bind(hospital_id)
        .bind(fleet_size)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
            .map_err(store_error)?
            .map(Into::into)
            .ok_or(StoreError::AlreadyExists)
    }

    async fn try_decrement(
        &self,
        hospital_id: &str,
    ) -> StoreResult<Option<AmbulanceAvailability>> {
        let timer = QueryTimer::new("try_decrement_availability");
        let result = sqlx::query_as::<_, AmbulanceAvailabilityEntity>(
            r#"
            UPDATE ambulance_availability
            SET available_count = available_count - 1, updated_at = NOW()
            WHERE hospital_id = $1 AND available_count > 0
            RETURNING hospital_id, available_count, total_count, created_at, updated_at
            "#,
        )
        .bind(hospital_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn increment_clamped(
        &self,
        hospital_id: &str,
    ) -> StoreResult<Option<AmbulanceAvailability>> {
        let timer = QueryTimer::new("increment_availability");
        let result = sqlx::query_as::<_, AmbulanceAvailabilityEntity>(
            r#"
            UPDATE ambulance_availability
            SET available_count = LEAST(total_count, available_count + 1), updated_at = NOW()
            WHERE hospital_id = $1
            RETURNING hospital_id, available_count, total_count, created_at, updated_at
            "#,
        )
        .bind(hospital_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }
}

//! Ambulance request repository.

use chrono::{DateTime, Utc};
use domain::models::{
    AmbulanceRequest, AmbulanceRequestStatus, NewAmbulanceRequest, RequestFilter,
};
use domain::services::{AmbulanceRequestStore, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{AmbulanceRequestEntity, AmbulanceRequestStatusDb};
use crate::error::store_error;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, hospital_id, user_id, patient_name, location, description, status, \
                       created_at, updated_at, dispatched_at, completed_at";

fn status_texts(statuses: &[AmbulanceRequestStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[derive(Clone)]
pub struct AmbulanceRequestRepository {
    pool: PgPool,
}

impl AmbulanceRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AmbulanceRequestStore for AmbulanceRequestRepository {
    async fn insert(&self, request: NewAmbulanceRequest) -> StoreResult<AmbulanceRequest> {
        let timer = QueryTimer::new("insert_ambulance_request");
        let sql = format!(
            "INSERT INTO ambulance_requests \
             (hospital_id, user_id, patient_name, location, description) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        );
        let result = sqlx::query_as::<_, AmbulanceRequestEntity>(&sql)
            .bind(&request.hospital_id)
            .bind(request.user_id)
            .bind(&request.patient_name)
            .bind(&request.location)
            .bind(&request.description)
            .fetch_one(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.into())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AmbulanceRequest>> {
        let timer = QueryTimer::new("find_ambulance_request_by_id");
        let sql = format!("SELECT {COLUMNS} FROM ambulance_requests WHERE id = $1");
        let result = sqlx::query_as::<_, AmbulanceRequestEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn list_for_hospital(
        &self,
        hospital_id: &str,
        filter: &RequestFilter<AmbulanceRequestStatus>,
    ) -> StoreResult<Vec<AmbulanceRequest>> {
        let timer = QueryTimer::new("list_ambulance_requests");
        let sql = format!(
            "SELECT {COLUMNS} FROM ambulance_requests \
             WHERE hospital_id = $1 AND (cardinality($2::text[]) = 0 OR status::text = ANY($2)) \
             ORDER BY created_at DESC, id \
             LIMIT $3 OFFSET $4"
        );
        let result = sqlx::query_as::<_, AmbulanceRequestEntity>(&sql)
            .bind(hospital_id)
            .bind(status_texts(&filter.statuses))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn count_for_hospital(
        &self,
        hospital_id: &str,
        statuses: &[AmbulanceRequestStatus],
    ) -> StoreResult<i64> {
        let timer = QueryTimer::new("count_ambulance_requests");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM ambulance_requests
            WHERE hospital_id = $1 AND (cardinality($2::text[]) = 0 OR status::text = ANY($2))
            "#,
        )
        .bind(hospital_id)
        .bind(status_texts(statuses))
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result.map_err(store_error)
    }

    async fn transition(
        &self,
        id: Uuid,
        hospital_id: &str,
        from: AmbulanceRequestStatus,
        to: AmbulanceRequestStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AmbulanceRequest>> {
        let timer = QueryTimer::new("transition_ambulance_request");
        let dispatched_at = (to == AmbulanceRequestStatus::Dispatched).then_some(at);
        let completed_at = (to == AmbulanceRequestStatus::Completed).then_some(at);
        let sql = format!(
            "UPDATE ambulance_requests \
             SET status = $4, updated_at = $5, \
                 dispatched_at = COALESCE($6, dispatched_at), \
                 completed_at = COALESCE($7, completed_at) \
             WHERE id = $1 AND hospital_id = $2 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        let result = sqlx::query_as::<_, AmbulanceRequestEntity>(&sql)
            .bind(id)
            .bind(hospital_id)
            .bind(AmbulanceRequestStatusDb::from(from))
            .bind(AmbulanceRequestStatusDb::from(to))
            .bind(at)
            .bind(dispatched_at)
            .bind(completed_at)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }
}

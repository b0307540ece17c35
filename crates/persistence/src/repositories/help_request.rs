//! Help request repository.

use chrono::{DateTime, Utc};
use domain::models::{HelpRequest, HelpRequestStatus, NewHelpRequest, RequestFilter};
use domain::services::{HelpRequestStore, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{HelpRequestEntity, HelpRequestStatusDb};
use crate::error::store_error;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, hospital_id, user_id, patient_name, description, status, \
                       created_at, updated_at, resolved_at";

fn status_texts(statuses: &[HelpRequestStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[derive(Clone)]
pub struct HelpRequestRepository {
    pool: PgPool,
}

impl HelpRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl HelpRequestStore for HelpRequestRepository {
    async fn insert(&self, request: NewHelpRequest) -> StoreResult<HelpRequest> {
        let timer = QueryTimer::new("insert_help_request");
        let sql = format!(
            "INSERT INTO help_requests (hospital_id, user_id, patient_name, description) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        let result = sqlx::query_as::<_, HelpRequestEntity>(&sql)
            .bind(&request.hospital_id)
            .bind(request.user_id)
            .bind(&request.patient_name)
            .bind(&request.description)
            .fetch_one(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.into())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<HelpRequest>> {
        let timer = QueryTimer::new("find_help_request_by_id");
        let sql = format!("SELECT {COLUMNS} FROM help_requests WHERE id = $1");
        let result = sqlx::query_as::<_, HelpRequestEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn list_for_hospital(
        &self,
        hospital_id: &str,
        filter: &RequestFilter<HelpRequestStatus>,
    ) -> StoreResult<Vec<HelpRequest>> {
        let timer = QueryTimer::new("list_help_requests");
        // An empty status array means no filter.
        let sql = format!(
            "SELECT {COLUMNS} FROM help_requests \
             WHERE hospital_id = $1 AND (cardinality($2::text[]) = 0 OR status::text = ANY($2)) \
             ORDER BY created_at DESC, id \
             LIMIT $3 OFFSET $4"
        );
        let result = sqlx::query_as::<_, HelpRequestEntity>(&sql)
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
        statuses: &[HelpRequestStatus],
    ) -> StoreResult<i64> {
        let timer = QueryTimer::new("count_help_requests");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM help_requests
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
        from: HelpRequestStatus,
        to: HelpRequestStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<HelpRequest>> {
        let timer = QueryTimer::new("transition_help_request");
        let resolved_at = (to == HelpRequestStatus::Resolved).then_some(at);
        let sql = format!(
            "UPDATE help_requests \
             SET status = $4, updated_at = $5, resolved_at = COALESCE($6, resolved_at) \
             WHERE id = $1 AND hospital_id = $2 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        let result = sqlx::query_as::<_, HelpRequestEntity>(&sql)
            .bind(id)
            .bind(hospital_id)
            .bind(HelpRequestStatusDb::from(from))
            .bind(HelpRequestStatusDb::from(to))
            .bind(at)
            .bind(resolved_at)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }
}

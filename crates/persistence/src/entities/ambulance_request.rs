//! Ambulance request entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{AmbulanceRequest, AmbulanceRequestStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for ambulance request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "ambulance_request_status", rename_all = "lowercase")]
pub enum AmbulanceRequestStatusDb {
    Pending,
    Dispatched,
    Completed,
    Rejected,
}

impl From<AmbulanceRequestStatus> for AmbulanceRequestStatusDb {
    fn from(status: AmbulanceRequestStatus) -> Self {
        match status {
            AmbulanceRequestStatus::Pending => AmbulanceRequestStatusDb::Pending,
            AmbulanceRequestStatus::Dispatched => AmbulanceRequestStatusDb::Dispatched,
            AmbulanceRequestStatus::Completed => AmbulanceRequestStatusDb::Completed,
            AmbulanceRequestStatus::Rejected => AmbulanceRequestStatusDb::Rejected,
        }
    }
}

impl From<AmbulanceRequestStatusDb> for AmbulanceRequestStatus {
    fn from(status: AmbulanceRequestStatusDb) -> Self {
        match status {
            AmbulanceRequestStatusDb::Pending => AmbulanceRequestStatus::Pending,
            AmbulanceRequestStatusDb::Dispatched => AmbulanceRequestStatus::Dispatched,
            AmbulanceRequestStatusDb::Completed => AmbulanceRequestStatus::Completed,
            AmbulanceRequestStatusDb::Rejected => AmbulanceRequestStatus::Rejected,
        }
    }
}

/// Database row mapping for the ambulance_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct AmbulanceRequestEntity {
    pub id: Uuid,
    pub hospital_id: String,
    pub user_id: Option<Uuid>,
    pub patient_name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: AmbulanceRequestStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<AmbulanceRequestEntity> for AmbulanceRequest {
    fn from(entity: AmbulanceRequestEntity) -> Self {
        AmbulanceRequest {
            id: entity.id,
            hospital_id: entity.hospital_id,
            user_id: entity.user_id,
            patient_name: entity.patient_name,
            location: entity.location,
            description: entity.description,
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            dispatched_at: entity.dispatched_at,
            completed_at: entity.completed_at,
        }
    }
}

//! Help request entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{HelpRequest, HelpRequestStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for help request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "help_request_status", rename_all = "kebab-case")]
pub enum HelpRequestStatusDb {
    Pending,
    InProgress,
    Resolved,
    Cancelled,
}

impl From<HelpRequestStatus> for HelpRequestStatusDb {
    fn from(status: HelpRequestStatus) -> Self {
        match status {
            HelpRequestStatus::Pending => HelpRequestStatusDb::Pending,
            HelpRequestStatus::InProgress => HelpRequestStatusDb::InProgress,
            HelpRequestStatus::Resolved => HelpRequestStatusDb::Resolved,
            HelpRequestStatus::Cancelled => HelpRequestStatusDb::Cancelled,
        }
    }
}

impl From<HelpRequestStatusDb> for HelpRequestStatus {
    fn from(status: HelpRequestStatusDb) -> Self {
        match status {
            HelpRequestStatusDb::Pending => HelpRequestStatus::Pending,
            HelpRequestStatusDb::InProgress => HelpRequestStatus::InProgress,
            HelpRequestStatusDb::Resolved => HelpRequestStatus::Resolved,
            HelpRequestStatusDb::Cancelled => HelpRequestStatus::Cancelled,
        }
    }
}

/// Database row mapping for the help_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct HelpRequestEntity {
    pub id: Uuid,
    pub hospital_id: String,
    pub user_id: Option<Uuid>,
    pub patient_name: String,
    pub description: Option<String>,
    pub status: HelpRequestStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<HelpRequestEntity> for HelpRequest {
    fn from(entity: HelpRequestEntity) -> Self {
        HelpRequest {
            id: entity.id,
            hospital_id: entity.hospital_id,
            user_id: entity.user_id,
            patient_name: entity.patient_name,
            description: entity.description,
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            resolved_at: entity.resolved_at,
        }
    }
}

//! Ambulance availability entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::AmbulanceAvailability;
use sqlx::FromRow;

/// Database row mapping for the ambulance_availability table.
#[derive(Debug, Clone, FromRow)]
pub struct AmbulanceAvailabilityEntity {
    pub hospital_id: String,
    pub available_count: i32,
    pub total_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AmbulanceAvailabilityEntity> for AmbulanceAvailability {
    fn from(entity: AmbulanceAvailabilityEntity) -> Self {
        AmbulanceAvailability {
            hospital_id: entity.hospital_id,
            available_count: entity.available_count,
            total_count: entity.total_count,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

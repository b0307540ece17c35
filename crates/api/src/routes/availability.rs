//! Ambulance availability reads.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::error::check_hospital_id;
use domain::models::AvailabilityResponse;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{HospitalAdmin, OptionalPatient};

/// Current availability for a hospital, as shown to patients.
///
/// GET /api/v1/hospitals/:hospital_id/ambulance-availability
pub async fn get_availability(
    State(state): State<AppState>,
    _patient: OptionalPatient,
    Path(hospital_id): Path<String>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    check_hospital_id(&hospital_id)?;
    read(&state, &hospital_id).await.map(Json)
}

/// Availability for the admin's own hospital.
///
/// GET /api/v1/admin/ambulance-availability
pub async fn get_admin_availability(
    State(state): State<AppState>,
    admin: HospitalAdmin,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    read(&state, &admin.hospital_id).await.map(Json)
}

async fn read(state: &AppState, hospital_id: &str) -> Result<AvailabilityResponse, ApiError> {
    let row = state.ledger.get_or_init(hospital_id).await?;
    Ok(row.to_response(state.config.ledger.low_availability_threshold))
}

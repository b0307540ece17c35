//! Recent activity for the admin dashboard.

use axum::{extract::State, Json};
use domain::models::activity::ActivityFeedResponse;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::HospitalAdmin;

/// GET /api/v1/admin/activity
pub async fn get_activity(
    State(state): State<AppState>,
    admin: HospitalAdmin,
) -> Result<Json<ActivityFeedResponse>, ApiError> {
    let data = state.activity.recent(&admin.hospital_id).await?;
    Ok(Json(ActivityFeedResponse {
        hospital_id: admin.hospital_id,
        data,
    }))
}

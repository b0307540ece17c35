//! Ambulance request endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::ambulance_request::{
    ListAmbulanceRequestsResponse, SubmitAmbulanceRequestRequest, SubmitAmbulanceRequestResponse,
};
use domain::models::request::{ListRequestsQuery, RejectRequestBody};
use domain::models::{AmbulanceRequest, AmbulanceRequestStatus, RequestKind};
use domain::services::Transitioned;
use uuid::Uuid;

use super::{lifecycle_error, list_window, pagination, TransitionResponse};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{HospitalAdmin, OptionalPatient};
use crate::middleware::metrics::{record_ledger_effect, record_request_submitted, record_transition};

const KIND: RequestKind = RequestKind::Ambulance;

type AmbulanceTransition = Json<TransitionResponse<AmbulanceRequest>>;

/// Request an ambulance. A unit is taken immediately; 409 with the current
/// counts when none is free.
///
/// POST /api/v1/hospitals/:hospital_id/ambulance-requests
pub async fn submit_ambulance_request(
    State(state): State<AppState>,
    patient: OptionalPatient,
    Path(hospital_id): Path<String>,
    Json(request): Json<SubmitAmbulanceRequestRequest>,
) -> Result<(StatusCode, Json<SubmitAmbulanceRequestResponse>), ApiError> {
    let transitioned = state
        .ambulance_requests
        .submit(&hospital_id, patient.user_id(), &request)
        .await
        .map_err(lifecycle_error(KIND))?;

    record_request_submitted(KIND);
    record_ledger_effect(KIND, &transitioned.ledger);

    let threshold = state.config.ledger.low_availability_threshold;
    let availability = match transitioned.ledger.availability() {
        Some(row) => row.to_response(threshold),
        None => state
            .ledger
            .get_or_init(&hospital_id)
            .await?
            .to_response(threshold),
    };

    Ok((
        StatusCode::CREATED,
        Json(SubmitAmbulanceRequestResponse {
            request: transitioned.request,
            availability,
        }),
    ))
}

/// List the admin hospital's ambulance requests, newest first.
///
/// GET /api/v1/admin/ambulance-requests?status=&page=&per_page=
pub async fn list_ambulance_requests(
    State(state): State<AppState>,
    admin: HospitalAdmin,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<ListAmbulanceRequestsResponse>, ApiError> {
    let (filter, page, per_page) =
        list_window::<AmbulanceRequestStatus>(&query, state.config.limits.max_page_size)?;

    let result = state
        .ambulance_requests
        .list(&admin.hospital_id, &filter)
        .await
        .map_err(lifecycle_error(KIND))?;

    Ok(Json(ListAmbulanceRequestsResponse {
        data: result.data,
        pagination: pagination(page, per_page, result.total),
    }))
}

/// POST /api/v1/admin/ambulance-requests/:id/dispatch
pub async fn dispatch_ambulance_request(
    State(state): State<AppState>,
    admin: HospitalAdmin,
    Path(id): Path<Uuid>,
) -> Result<AmbulanceTransition, ApiError> {
    let transitioned = state
        .ambulance_requests
        .dispatch(&admin.hospital_id, id)
        .await
        .map_err(lifecycle_error(KIND))?;

    Ok(respond(&state, transitioned))
}

/// Complete a dispatched request and return its unit.
///
/// POST /api/v1/admin/ambulance-requests/:id/complete
pub async fn complete_ambulance_request(
    State(state): State<AppState>,
    admin: HospitalAdmin,
    Path(id): Path<Uuid>,
) -> Result<AmbulanceTransition, ApiError> {
    let transitioned = state
        .ambulance_requests
        .complete(&admin.hospital_id, id)
        .await
        .map_err(lifecycle_error(KIND))?;

    Ok(respond(&state, transitioned))
}

/// Reject a pending request and return the unit taken at submission.
/// The body must carry `"confirm": true`.
///
/// POST /api/v1/admin/ambulance-requests/:id/reject
pub async fn reject_ambulance_request(
    State(state): State<AppState>,
    admin: HospitalAdmin,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectRequestBody>>,
) -> Result<AmbulanceTransition, ApiError> {
    let confirmed = body.map(|Json(b)| b.confirm).unwrap_or(false);
    let transitioned = state
        .ambulance_requests
        .reject(&admin.hospital_id, id, confirmed)
        .await
        .map_err(lifecycle_error(KIND))?;

    Ok(respond(&state, transitioned))
}

fn respond(state: &AppState, transitioned: Transitioned<AmbulanceRequest>) -> AmbulanceTransition {
    record_transition(KIND, transitioned.request.status.as_str());
    record_ledger_effect(KIND, &transitioned.ledger);
    Json(TransitionResponse::new(
        transitioned,
        state.config.ledger.low_availability_threshold,
    ))
}
